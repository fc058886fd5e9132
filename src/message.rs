/// DMX slot the ramp drives on the lighting node
pub const RAMP_CHANNEL: u8 = 101;

/// Size of one message on the wire
pub const MESSAGE_LEN: usize = 2;

/// A single `[channel, value]` control message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMessage {
    pub channel: u8,
    pub value: u8,
}

impl ControlMessage {
    pub fn new(channel: u8, value: u8) -> Self {
        ControlMessage { channel, value }
    }

    /// Wire form, no framing
    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        [self.channel, self.value]
    }
}

/// Drain every complete message from the front of `buffer`.
///
/// An odd trailing byte stays in the buffer until the rest of its message arrives.
pub fn drain_messages(buffer: &mut Vec<u8>) -> Vec<ControlMessage> {
    let complete = buffer.len() - buffer.len() % MESSAGE_LEN;
    let messages = buffer[..complete]
        .chunks_exact(MESSAGE_LEN)
        .map(|pair| ControlMessage::new(pair[0], pair[1]))
        .collect();
    buffer.drain(..complete);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_two_bytes() {
        let msg = ControlMessage::new(RAMP_CHANNEL, 0xFF);
        assert_eq!(msg.encode(), [0x65, 0xFF]);
    }

    #[test]
    fn test_drain_complete_pairs() {
        let mut buffer = vec![0x65, 0x00, 0x65, 0x01];
        let messages = drain_messages(&mut buffer);
        assert_eq!(
            messages,
            vec![ControlMessage::new(101, 0), ControlMessage::new(101, 1)]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_keeps_odd_byte() {
        let mut buffer = vec![0x65, 0x10, 0x65];
        let messages = drain_messages(&mut buffer);
        assert_eq!(messages, vec![ControlMessage::new(101, 0x10)]);
        assert_eq!(buffer, vec![0x65]);

        buffer.push(0x11);
        let messages = drain_messages(&mut buffer);
        assert_eq!(messages, vec![ControlMessage::new(101, 0x11)]);
        assert!(buffer.is_empty());
    }
}
