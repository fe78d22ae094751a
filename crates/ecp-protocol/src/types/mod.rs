//! Protocol message shapes.
//!
//! The closed set of messages the ECP client produces or consumes: the SOAP
//! envelope, the PAOS/ECP header blocks, and IdP entries.

mod constants;
mod ecp;
mod envelope;
mod idp;
mod paos;

pub use constants::*;
pub use ecp::*;
pub use envelope::*;
pub use idp::*;
pub use paos::{issue_message_id, PaosRequestHeader};
