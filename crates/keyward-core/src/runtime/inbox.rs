//! Inbox channel types.
//!
//! Effect handlers send completion dispatches here; the session loop
//! drains the receiver and steps the machine one dispatch at a time.

use tokio::sync::mpsc;

use crate::machine::Dispatch;

pub(super) type DispatchSender<C> = mpsc::UnboundedSender<Dispatch<C>>;
pub(super) type DispatchReceiver<C> = mpsc::UnboundedReceiver<Dispatch<C>>;
