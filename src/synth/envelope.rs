/// Gate-driven amplitude envelope.
///
/// While the gate is held the level follows the note velocity, scaled down
/// by `attack_gain` for headroom. Once the gate drops the level decays
/// geometrically from wherever it was, one `release_decay` step per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateEnvelope {
    pub attack_gain: f64,
    pub release_decay: f64,
}

impl GateEnvelope {
    pub fn new(attack_gain: f64, release_decay: f64) -> Self {
        Self {
            attack_gain,
            release_decay,
        }
    }

    /// Effective level for the current sample.
    pub fn evaluate(&self, gate: bool, velocity: f64, last_level: f64) -> f64 {
        if gate {
            velocity * self.attack_gain
        } else {
            last_level * self.release_decay
        }
    }
}

impl Default for GateEnvelope {
    fn default() -> Self {
        Self {
            attack_gain: 0.8,
            release_decay: 0.9995,
        }
    }
}
