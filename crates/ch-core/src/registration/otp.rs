//! Six-cell one-time passcode entry.

pub const OTP_LENGTH: usize = 6;

/// Passcode cells plus the index of the cell that should hold input focus.
///
/// Always exactly [`OTP_LENGTH`] cells; each is empty or one ASCII digit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OtpBuffer {
    cells: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, index: usize) -> Option<char> {
        self.cells.get(index).copied().flatten()
    }

    pub fn cells(&self) -> &[Option<char>; OTP_LENGTH] {
        &self.cells
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Typed entry into one cell.
    ///
    /// Anything but a single decimal digit, or an index outside the buffer,
    /// leaves the buffer untouched and returns `false`. Accepting a digit
    /// moves focus to the next cell; the last cell keeps it.
    pub fn set_cell(&mut self, index: usize, input: char) -> bool {
        if index >= OTP_LENGTH || !input.is_ascii_digit() {
            return false;
        }
        self.cells[index] = Some(input);
        self.focus = (index + 1).min(OTP_LENGTH - 1);
        true
    }

    /// Backspace pressed in `index`.
    ///
    /// A filled cell is cleared in place. On an empty cell focus retreats to
    /// the previous cell, never below zero. Returns the new focus.
    pub fn backspace(&mut self, index: usize) -> usize {
        if index >= OTP_LENGTH {
            return self.focus;
        }
        if self.cells[index].take().is_some() {
            self.focus = index;
        } else {
            self.focus = index.saturating_sub(1);
        }
        self.focus
    }

    /// Replace every cell at once from pasted text.
    ///
    /// Only exactly six decimal digits are accepted; any other shape is
    /// ignored and returns `false`.
    pub fn paste_fill(&mut self, text: &str) -> bool {
        let mut digits = [None; OTP_LENGTH];
        let mut count = 0;
        for c in text.chars() {
            if count == OTP_LENGTH || !c.is_ascii_digit() {
                return false;
            }
            digits[count] = Some(c);
            count += 1;
        }
        if count != OTP_LENGTH {
            return false;
        }
        self.cells = digits;
        self.focus = OTP_LENGTH - 1;
        true
    }

    /// Filled cells concatenated in order.
    pub fn join(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
