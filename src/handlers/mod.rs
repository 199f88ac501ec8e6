pub mod auth;
pub mod complaints;
pub mod discussions;
pub mod feedback;
pub mod groups;
pub mod messages;
pub mod realtime;
pub mod reports;
pub mod users;
