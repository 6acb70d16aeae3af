/// Follow-up work a message subscriber asks the connector to perform once
/// the subscriber returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Queue a chat line to the joined channel.
    SendChat { text: String },
}
