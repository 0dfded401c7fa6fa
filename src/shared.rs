// The symbolic vocabulary that sequences are written in.
//
// A step list is written as alternating event / length symbols, e.g.
//   ["none", "s", "c4", "s", "a2", "e", ...]      (a bassline)
//   ["x", "e", "o", "e", "x", "e", "o", "e"]      (a kick)
//
// Nothing in here can fail: a symbol we don't know becomes an `Unknown`
// arm, which voices ignore and which lasts one beat. A live set shouldn't
// stop because of a typo.

use serde::{Deserialize, Serialize};

// MIDI note number
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pitch(pub u8);

impl Pitch {
    // "c4" -> 60, "a#2"/"as2" -> 46, "eb3" -> 51
    pub fn parse(symbol: &str) -> Option<Self> {
        let lower = symbol.to_ascii_lowercase();
        let mut chars = lower.chars().peekable();
        let base: i32 = match chars.next()? {
            'c' => 0,
            'd' => 2,
            'e' => 4,
            'f' => 5,
            'g' => 7,
            'a' => 9,
            'b' => 11,
            _ => return None,
        };
        let accidental = match chars.peek() {
            Some('#') | Some('s') => { chars.next(); 1 }
            Some('b') => { chars.next(); -1 }
            _ => 0,
        };
        let octave: String = chars.collect();
        if octave.is_empty() || !octave.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let octave: i32 = octave.parse().ok()?;
        let midi = octave.checked_add(1)?.checked_mul(12)?.checked_add(base + accidental)?;
        u8::try_from(midi).ok().filter(|m| *m <= 127).map(Pitch)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Rest,
    Hit,   // the only thing a drum voice responds to
    Ghost, // written "o"; a placeholder in drum lines
    Note(Pitch),
    Unknown,
}

impl Event {
    pub fn parse(symbol: &str) -> Self {
        match symbol.trim() {
            "none" | "rest" | "-" | "~" => Event::Rest,
            "x" => Event::Hit,
            "o" => Event::Ghost,
            other => Pitch::parse(other).map(Event::Note).unwrap_or(Event::Unknown),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteLength {
    Whole,
    Half,
    DottedHalf,
    Quarter,
    DottedQuarter,
    Eighth,
    DottedEighth,
    Sixteenth,
    DottedSixteenth,
    ThirtySecond,
    Unknown,
}

impl NoteLength {
    pub fn parse(symbol: &str) -> Self {
        match symbol.trim() {
            "w" | "whole" => NoteLength::Whole,
            "h" | "half" => NoteLength::Half,
            "h." | "dotted-half" => NoteLength::DottedHalf,
            "q" | "quarter" => NoteLength::Quarter,
            "q." | "dotted-quarter" => NoteLength::DottedQuarter,
            "e" | "eighth" => NoteLength::Eighth,
            "e." | "dotted-eighth" => NoteLength::DottedEighth,
            "s" | "sixteenth" => NoteLength::Sixteenth,
            "s." | "dotted-sixteenth" => NoteLength::DottedSixteenth,
            "t" | "thirty-second" => NoteLength::ThirtySecond,
            _ => NoteLength::Unknown,
        }
    }

    pub fn beats(self) -> f64 {
        match self {
            NoteLength::Whole => 4.0,
            NoteLength::Half => 2.0,
            NoteLength::DottedHalf => 3.0,
            NoteLength::Quarter => 1.0,
            NoteLength::DottedQuarter => 1.5,
            NoteLength::Eighth => 0.5,
            NoteLength::DottedEighth => 0.75,
            NoteLength::Sixteenth => 0.25,
            NoteLength::DottedSixteenth => 0.375,
            NoteLength::ThirtySecond => 0.125,
            NoteLength::Unknown => 1.0,
        }
    }
}

// one note-step of a sequence: what to play, then how long to wait
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub event: Event,
    pub length: NoteLength,
}

impl Step {
    pub fn new(event: Event, length: NoteLength) -> Self {
        Self { event, length }
    }
}
