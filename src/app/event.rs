/// Handle returned by [`crate::irc::connection::Connector::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// A chat line received on the joined channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Nickname of the user who sent the line.
    pub sender: String,
    /// Full chat text.
    pub text: String,
}
