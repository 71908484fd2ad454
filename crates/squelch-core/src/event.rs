//! Timestamped musical events and key-permissibility masks.

/// Bitmask over the 12 semitone classes. Bit `n` set means pitch class `n`
/// (0 = C) is permitted.
///
/// # Example
///
/// ```rust
/// use squelch_core::KeyMask;
///
/// let c_major = KeyMask::MAJOR;
/// assert!(c_major.contains(4));   // E
/// assert!(!c_major.contains(1));  // C#
/// assert_eq!(c_major.nearest(1), Some(0));
///
/// // A major triad expressed relative to its root, moved to D.
/// let d_major = KeyMask::from_keys(&[0, 4, 7]).rotate(2);
/// assert!(d_major.contains(6));   // F#
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyMask(u16);

impl KeyMask {
    const BITS: u16 = 0x0FFF;

    /// Every key permitted.
    pub const ALL: Self = Self(Self::BITS);
    /// No key permitted.
    pub const NONE: Self = Self(0);
    /// C major scale.
    pub const MAJOR: Self = Self(0b1010_1011_0101);
    /// C natural minor scale.
    pub const MINOR: Self = Self(0b0101_1010_1101);

    /// Build from raw bits; bits above the 12th are discarded.
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::BITS)
    }

    /// Build from a list of pitch classes (taken modulo 12).
    pub fn from_keys(keys: &[u8]) -> Self {
        Self(keys.iter().fold(0u16, |acc, &k| acc | 1 << (k % 12)))
    }

    /// Raw 12-bit value.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether no key is permitted.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of permitted keys.
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether pitch class `key` (modulo 12) is permitted.
    #[inline]
    pub const fn contains(self, key: u8) -> bool {
        self.0 & (1 << (key % 12)) != 0
    }

    /// Transpose a root-relative mask so that bit 0 lands on `root`.
    pub const fn rotate(self, root: u8) -> Self {
        let r = (root % 12) as u32;
        let bits = self.0 as u32;
        let rotated = ((bits << r) | (bits >> (12 - r))) & Self::BITS as u32;
        Self(rotated as u16)
    }

    /// Nearest permitted pitch class to `key`, searching outward one semitone
    /// at a time. Ties resolve downward. `None` when the mask is empty.
    pub fn nearest(self, key: u8) -> Option<u8> {
        let key = key % 12;
        if self.contains(key) {
            return Some(key);
        }
        (1..=6u8).find_map(|distance| {
            let below = (key + 12 - distance) % 12;
            let above = (key + distance) % 12;
            if self.contains(below) {
                Some(below)
            } else if self.contains(above) {
                Some(above)
            } else {
                None
            }
        })
    }
}

impl Default for KeyMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// What an [`Event`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Start a note.
    NoteOn {
        /// MIDI pitch.
        pitch: u8,
        /// MIDI velocity, 1..=127.
        velocity: u8,
    },
    /// Release a note.
    NoteOff {
        /// MIDI pitch.
        pitch: u8,
    },
    /// Replace the scale-follow mask.
    ScaleMask {
        /// Permitted pitch classes.
        mask: KeyMask,
    },
    /// Replace the chord-follow mask.
    ChordMask {
        /// Chord root pitch class.
        root: u8,
        /// Chord tones relative to `root`.
        mask: KeyMask,
    },
    /// Release everything.
    AllNotesOff,
}

/// An event positioned relative to the start of the current audio block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Sample offset from the block start.
    pub offset: usize,
    /// Payload.
    pub kind: EventKind,
}

impl Event {
    /// Note-on at `offset`.
    pub const fn note_on(offset: usize, pitch: u8, velocity: u8) -> Self {
        Self {
            offset,
            kind: EventKind::NoteOn { pitch, velocity },
        }
    }

    /// Note-off at `offset`.
    pub const fn note_off(offset: usize, pitch: u8) -> Self {
        Self {
            offset,
            kind: EventKind::NoteOff { pitch },
        }
    }

    /// Scale mask change at `offset`.
    pub const fn scale_mask(offset: usize, mask: KeyMask) -> Self {
        Self {
            offset,
            kind: EventKind::ScaleMask { mask },
        }
    }

    /// Chord mask change at `offset`.
    pub const fn chord_mask(offset: usize, root: u8, mask: KeyMask) -> Self {
        Self {
            offset,
            kind: EventKind::ChordMask { root, mask },
        }
    }

    /// All-notes-off at `offset`.
    pub const fn all_notes_off(offset: usize) -> Self {
        Self {
            offset,
            kind: EventKind::AllNotesOff,
        }
    }
}
