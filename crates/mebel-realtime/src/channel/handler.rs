//! Inbound frame decoding and delivery to the registered handler.

use tracing::{debug, warn};

use crate::envelope::{decode, Envelope};

/// Decode one text frame and hand it to `handler`.
///
/// Malformed frames are logged and dropped. Returns whether the handler ran.
pub(crate) fn dispatch_frame<F>(text: &str, handler: &mut F) -> bool
where
    F: FnMut(Envelope),
{
    match decode(text) {
        Ok(envelope) => {
            debug!(
                kind = %envelope.kind(),
                chat_id = %envelope.conversation_id,
                "Envelope received"
            );
            handler(envelope);
            true
        }
        Err(e) => {
            warn!(error = %e, len = text.len(), "Dropping malformed envelope");
            false
        }
    }
}
