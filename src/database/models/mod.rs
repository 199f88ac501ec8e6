pub mod complaint;
pub mod discussion;
pub mod feedback;
pub mod group;
pub mod location;
pub mod message;
pub mod report;
pub mod user;

pub use complaint::{Complaint, ComplaintStatus};
pub use discussion::{Discussion, DiscussionComment, DiscussionStatus};
pub use feedback::{Feedback, ServiceType};
pub use group::{Group, GroupAnnouncement, GroupMember};
pub use location::Location;
pub use message::{Message, MessageStatus};
pub use report::{Report, ReportData, ReportFilters, ReportType};
pub use user::{Role, User};
