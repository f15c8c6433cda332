//! Pointer contact tracking.
//!
//! The server only understands two touch commands: "a contact is active" and
//! "the last contact was lifted".  [`InputGate`] keeps a running count of held
//! contacts and turns pointer down/up/move callbacks into [`TouchCommand`]s.
//!
//! The count is not clamped.  If a pointer-down is missed (for
//! example it happened outside the canvas) the count may go negative; that
//! only affects which command byte the next events carry.

use crate::protocol::messages::{CommandKind, TouchCommand};

/// Counts concurrently held contacts and selects touch commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputGate {
    contacts: i32,
}

impl InputGate {
    /// Creates a gate with no contacts held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of contacts currently believed to be held.  May be negative.
    pub fn contacts(&self) -> i32 {
        self.contacts
    }

    /// A contact went down at `(x, y)`.  Always emits a command.
    pub fn pointer_down(&mut self, x: u16, y: u16) -> TouchCommand {
        self.contacts = self.contacts.wrapping_add(1);
        TouchCommand::new(kind_for(self.contacts), x, y)
    }

    /// A contact was lifted at `(x, y)`.  Always emits a command.
    ///
    /// The command reflects the contacts left held once this one is gone, so
    /// lifting the last contact reports [`CommandKind::ContactReleased`].
    pub fn pointer_up(&mut self, x: u16, y: u16) -> TouchCommand {
        let remaining = self.contacts.wrapping_sub(1);
        let cmd = TouchCommand::new(kind_for(remaining), x, y);
        self.contacts = remaining;
        cmd
    }

    /// The pointer moved to `(x, y)`.  Emits only while a contact is held.
    pub fn pointer_move(&self, x: u16, y: u16) -> Option<TouchCommand> {
        (self.contacts > 0).then(|| TouchCommand::new(CommandKind::ContactActive, x, y))
    }
}

fn kind_for(contacts: i32) -> CommandKind {
    if contacts != 0 {
        CommandKind::ContactActive
    } else {
        CommandKind::ContactReleased
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode_touch_command;

    fn wire(cmd: TouchCommand) -> [u8; 5] {
        encode_touch_command(cmd.kind, cmd.x, cmd.y)
    }

    #[test]
    fn test_first_down_emits_active_command_bytes() {
        let mut gate = InputGate::new();

        let cmd = gate.pointer_down(10, 20);

        assert_eq!(gate.contacts(), 1);
        assert_eq!(wire(cmd), [0x01, 0x0A, 0x00, 0x14, 0x00]);
    }

    #[test]
    fn test_last_up_emits_released() {
        let mut gate = InputGate::new();
        gate.pointer_down(10, 20);

        let cmd = gate.pointer_up(10, 20);

        assert_eq!(gate.contacts(), 0);
        assert_eq!(wire(cmd)[0], 0x02);
    }

    #[test]
    fn test_move_without_contact_is_suppressed() {
        let gate = InputGate::new();
        assert_eq!(gate.pointer_move(5, 5), None);
    }

    #[test]
    fn test_move_while_held_streams_active() {
        let mut gate = InputGate::new();
        gate.pointer_down(0, 0);

        let cmd = gate.pointer_move(7, 9);

        assert_eq!(cmd, Some(TouchCommand::new(CommandKind::ContactActive, 7, 9)));
    }

    #[test]
    fn test_three_contacts_then_three_ups() {
        // Arrange: three downs without intervening ups
        let mut gate = InputGate::new();
        for i in 0..3 {
            assert_eq!(gate.pointer_down(i, i).kind, CommandKind::ContactActive);
        }
        assert_eq!(gate.contacts(), 3);

        // A move still streams while contacts are held.
        assert!(gate.pointer_move(1, 1).is_some());

        // Act
        let first = gate.pointer_up(1, 1);
        let second = gate.pointer_up(1, 1);
        let third = gate.pointer_up(1, 1);

        // Assert
        assert_eq!(first.kind, CommandKind::ContactActive);
        assert_eq!(second.kind, CommandKind::ContactActive);
        assert_eq!(third.kind, CommandKind::ContactReleased);
        assert_eq!(gate.contacts(), 0);
    }

    #[test]
    fn test_unmatched_up_goes_negative_and_is_not_corrected() {
        let mut gate = InputGate::new();

        let cmd = gate.pointer_up(0, 0);

        assert_eq!(gate.contacts(), -1);
        assert_eq!(cmd.kind, CommandKind::ContactActive);
        assert_eq!(gate.pointer_move(0, 0), None);

        // The next down brings the count back to zero and reports released.
        assert_eq!(gate.pointer_down(0, 0).kind, CommandKind::ContactReleased);
        assert_eq!(gate.contacts(), 0);
    }
}
