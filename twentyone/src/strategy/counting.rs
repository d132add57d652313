use rand::Rng;

/// Hi-Lo running-count maintenance with skill-parameterized error. A counter
/// of skill 100 always applies the exact adjustment; weaker counters flatten
/// or invert it, which models miscounting without a separate data channel.
#[derive(Debug, Clone, Copy)]
pub struct CardCountingEngine {
    skill: u8,
}

impl CardCountingEngine {
    pub fn new(skill: u8) -> CardCountingEngine {
        CardCountingEngine {
            skill: skill.min(100),
        }
    }

    pub fn skill(&self) -> u8 {
        self.skill
    }

    /// The true Hi-Lo adjustment: +1 for 2-6, 0 for 7-9, -1 for tens and aces.
    pub fn exact_adjustment(value: u8) -> i32 {
        match value {
            2..=6 => 1,
            7..=9 => 0,
            _ => -1,
        }
    }

    /// The adjustment this counter actually applies for a seen card value.
    /// The accuracy roll lands in [skill, 100]: 66 and up keeps the exact
    /// adjustment, 33-65 flattens it toward 0, below 33 inverts the sign.
    /// A neutral card that is misread becomes a random +1 or -1.
    pub fn adjustment(&self, value: u8, rng: &mut impl Rng) -> i32 {
        let exact = Self::exact_adjustment(value);
        let roll: u8 = rng.gen_range(self.skill..=100);
        if roll >= 66 {
            exact
        } else if roll >= 33 {
            if exact == 0 {
                Self::coin_flip(rng)
            } else {
                0
            }
        } else if exact == 0 {
            Self::coin_flip(rng)
        } else {
            -exact
        }
    }

    fn coin_flip(rng: &mut impl Rng) -> i32 {
        if rng.gen_bool(0.5) {
            1
        } else {
            -1
        }
    }
}
