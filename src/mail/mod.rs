//! Mail adapters: Resend for outbound mail, Gmail for reading a user's mailbox

pub mod error;
pub mod gmail;
pub mod resend;

pub use error::MailError;
pub use gmail::{GmailClient, GmailMessage};
pub use resend::{EmailRequest, ResendClient};
