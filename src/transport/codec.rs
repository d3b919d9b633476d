use crate::broker::message::Message;

/// Encodes one message as a wire frame.
///
/// The frame is three ordered fields terminated by a blank line:
///
/// ```text
/// id: <integer>
/// event: <string>
/// data: <string>
///
/// ```
///
/// Each frame is written to the response body as its own chunk, so the
/// client observes the event as soon as it is encoded. Buffering frames
/// together would turn the stream back into an ordinary response.
pub fn encode(msg: &Message) -> String {
    format!("id: {}\nevent: {}\ndata: {}\n\n", msg.id, msg.event, msg.data)
}
