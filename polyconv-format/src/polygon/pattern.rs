use anyhow::{anyhow, bail, Error};

/// The largest width accepted in a conversion.
const MAX_WIDTH: usize = 32;

/// A printf-like path pattern with at most one integer slot, like `tests/%02d.a`.
///
/// The supported conversions are `%d`, `%i` and `%u`, optionally with the `0` and `-` flags and a
/// width. `%%` is a literal percent sign.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathPattern {
    /// The text before the slot (or the whole pattern if there is no slot).
    prefix: String,
    /// The integer slot and the text after it.
    slot: Option<(Slot, String)>,
}

/// The formatting options of the integer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Slot {
    width: usize,
    zero: bool,
    left: bool,
}

impl PathPattern {
    /// Parse a pattern, failing if it contains more than one slot or unsupported conversions.
    pub fn parse(pattern: &str) -> Result<PathPattern, Error> {
        let mut prefix = String::new();
        let mut slot: Option<(Slot, String)> = None;
        let mut chars = pattern.chars().peekable();
        while let Some(ch) = chars.next() {
            let text = match &mut slot {
                Some((_, suffix)) => suffix,
                None => &mut prefix,
            };
            if ch != '%' {
                text.push(ch);
                continue;
            }
            let mut current = Slot::default();
            loop {
                match chars.peek() {
                    Some('0') => current.zero = true,
                    Some('-') => current.left = true,
                    _ => break,
                }
                chars.next();
            }
            while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                current.width = current
                    .width
                    .checked_mul(10)
                    .and_then(|width| width.checked_add(digit as usize))
                    .filter(|width| *width <= MAX_WIDTH)
                    .ok_or_else(|| anyhow!("Conversion width too large in pattern {:?}", pattern))?;
                chars.next();
            }
            match chars.next() {
                Some('%') if current == Slot::default() => text.push('%'),
                Some('d' | 'i' | 'u') => {
                    if slot.is_some() {
                        bail!("Pattern {:?} has more than one integer slot", pattern);
                    }
                    slot = Some((current, String::new()));
                }
                Some(other) => bail!("Unsupported conversion %{} in pattern {:?}", other, pattern),
                None => bail!("Pattern {:?} ends with an incomplete conversion", pattern),
            }
        }
        Ok(PathPattern { prefix, slot })
    }

    /// Substitute the value inside the slot of the pattern.
    pub fn format(&self, value: u32) -> String {
        let (slot, suffix) = match &self.slot {
            Some(slot) => slot,
            None => return self.prefix.clone(),
        };
        let number = match (slot.left, slot.zero) {
            (true, _) => format!("{:<width$}", value, width = slot.width),
            (false, true) => format!("{:0width$}", value, width = slot.width),
            (false, false) => format!("{:>width$}", value, width = slot.width),
        };
        format!("{}{}{}", self.prefix, number, suffix)
    }

    /// Whether the pattern contains the integer slot.
    pub fn has_slot(&self) -> bool {
        self.slot.is_some()
    }
}
