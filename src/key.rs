// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;

/// Identifies a sample in the buffer registry, and a voice group for stopping.
///
/// Keys are either numbers (typically MIDI note numbers) or names. A name that is the
/// canonical decimal spelling of an integer is stored as that integer, so `60` and `"60"`
/// refer to the same sample. Spellings like `"060"` or `"+60"` remain names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleKey {
    Number(i64),
    Name(String),
}

impl SampleKey {
    /// Returns the numeric value of this key, if it has one.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            SampleKey::Number(n) => Some(*n),
            SampleKey::Name(_) => None,
        }
    }

    /// Returns the name of this key, if it is not numeric.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            SampleKey::Number(_) => None,
            SampleKey::Name(name) => Some(name),
        }
    }

    fn from_name(name: String) -> SampleKey {
        match name.parse::<i64>() {
            Ok(number) if number.to_string() == name => SampleKey::Number(number),
            _ => SampleKey::Name(name),
        }
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleKey::Number(n) => write!(f, "{}", n),
            SampleKey::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for SampleKey {
    fn from(name: &str) -> Self {
        SampleKey::from_name(name.to_string())
    }
}

impl From<String> for SampleKey {
    fn from(name: String) -> Self {
        SampleKey::from_name(name)
    }
}

impl From<&String> for SampleKey {
    fn from(name: &String) -> Self {
        SampleKey::from_name(name.clone())
    }
}

impl From<&SampleKey> for SampleKey {
    fn from(key: &SampleKey) -> Self {
        key.clone()
    }
}

macro_rules! impl_numeric_key {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SampleKey {
                fn from(n: $t) -> Self {
                    SampleKey::Number(i64::from(n))
                }
            }
        )*
    };
}

impl_numeric_key!(u8, u16, u32, i8, i16, i32, i64);
