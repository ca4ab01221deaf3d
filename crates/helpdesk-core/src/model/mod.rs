//! Domain types: tickets, comments, and activity log entries.

pub mod activity;
pub mod comment;
pub mod patch;
pub mod ticket;

pub use activity::{ActivityAction, ActivityLogEntry};
pub use comment::{Comment, NewComment};
pub use patch::{FieldChange, TicketPatch};
pub use ticket::{NewTicket, ParseEnumError, Priority, Status, Ticket, TicketDetails};
