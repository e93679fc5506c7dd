//! Daily-wisdom WhatsApp sign-up form. Purely local: nothing is sent anywhere.

pub const CHANNEL_URL: &str = "https://whatsapp.com/channel/0029VbBNZ3vLdQedYdVbda2C";

/// Inputs this short are treated as incomplete numbers.
const MIN_PHONE_LEN: usize = 6;

fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionForm {
    pub phone: String,
    /// Cursor position in `phone`, in chars.
    pub cursor: usize,
    pub submitted: bool,
}

impl SubscriptionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, c: char) {
        if self.submitted {
            return;
        }
        let byte_pos = char_to_byte_index(&self.phone, self.cursor);
        self.phone.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.submitted || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.phone, self.cursor);
        self.phone.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.submitted || self.cursor >= self.phone.chars().count() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.phone, self.cursor);
        self.phone.remove(byte_pos);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.phone.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.phone.chars().count();
    }

    /// Accept the number if it is long enough. Returns whether it was accepted.
    pub fn submit(&mut self) -> bool {
        if self.phone.chars().count() >= MIN_PHONE_LEN {
            self.submitted = true;
        }
        self.submitted
    }

    /// Reopen the form to register another number. The previous number is
    /// left in place for editing.
    pub fn reset(&mut self) {
        self.submitted = false;
    }
}
