use std::sync::Arc;

use parley_db::Database;
use parley_gateway::hub::Hub;

use crate::conversations::ConversationService;
use crate::messages::MessageIntake;
use crate::notifications::NotificationService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub hub: Hub,
    pub jwt_secret: String,
    pub conversations: ConversationService,
    pub notifications: NotificationService,
    pub intake: MessageIntake,
}

impl AppStateInner {
    /// Wire the engines around one Store and one Hub.
    pub fn new(db: Arc<Database>, jwt_secret: String) -> AppState {
        let hub = Hub::new(db.clone());
        let conversations = ConversationService::new(db.clone(), hub.clone());
        let notifications = NotificationService::new(db.clone(), hub.clone());
        let intake = MessageIntake::new(db.clone(), hub.clone(), notifications.clone());

        Arc::new(Self {
            db,
            hub,
            jwt_secret,
            conversations,
            notifications,
            intake,
        })
    }
}
