use shared::{
    topics, OutboxRecord, ServiceError, UserCreatedEvent, UserDeletedEvent, UserEmailUpdatedEvent,
    EVENT_REVISION,
};
use uuid::Uuid;

use crate::models::User;

pub fn user_created(user: &User) -> Result<OutboxRecord, ServiceError> {
    let event = UserCreatedEvent {
        revision: EVENT_REVISION,
        user_id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    };

    OutboxRecord::new(user.id, topics::USER_STATE_CREATED, &event)
}

pub fn user_deleted(user: &User) -> Result<OutboxRecord, ServiceError> {
    let event = UserDeletedEvent {
        revision: EVENT_REVISION,
        user_id: user.id,
    };

    OutboxRecord::new(user.id, topics::USER_STATE_DELETED, &event)
}

pub fn user_email_updated(user_id: Uuid, email: &str) -> Result<OutboxRecord, ServiceError> {
    let event = UserEmailUpdatedEvent {
        revision: EVENT_REVISION,
        user_id,
        email: email.to_string(),
    };

    OutboxRecord::new(user_id, topics::USER_ATTR_EMAIL, &event)
}
