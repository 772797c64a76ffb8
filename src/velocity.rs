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

/// The highest MIDI velocity.
pub const MAX_MIDI_VELOCITY: f32 = 127.0;

/// The default volume and velocity curve: a MIDI velocity scaled linearly to gain.
pub fn midi_vel_to_gain(velocity: f32) -> f32 {
    velocity / MAX_MIDI_VELOCITY
}

pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_vel_to_gain() {
        assert_eq!(midi_vel_to_gain(0.0), 0.0);
        assert_eq!(midi_vel_to_gain(127.0), 1.0);
        let gain = midi_vel_to_gain(100.0);
        assert!(gain > 0.78 && gain < 0.79);
    }

    #[test]
    fn test_db_conversions() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-6.0) - 0.501).abs() < 1e-3);
        assert!((gain_to_db(db_to_gain(-12.0)) + 12.0).abs() < 1e-4);
    }
}
