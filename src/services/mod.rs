pub mod access;
pub mod auth_service;
pub mod expense_service;
pub mod friend_service;
pub mod notification_service;
pub mod settlement_service;
