use std::collections::VecDeque;
use std::fmt;

/// Deterministic PRNG with 256-bit state (32 bytes), stored in snapshots so a resumed session
/// shuffles and steals exactly as the uninterrupted one would have.
///
/// This is `xoshiro256**` seeded via SplitMix64.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameRng {
    state: [u64; 4],
}

impl GameRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        let mut sm = SplitMix64 { state: seed };
        Self {
            state: [sm.next(), sm.next(), sm.next(), sm.next()],
        }
    }

    pub fn state_bytes(&self) -> [u8; 32] {
        let mut out = [0_u8; 32];
        for (i, word) in self.state.iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub fn from_state_bytes(bytes: [u8; 32]) -> Self {
        let mut state = [0_u64; 4];
        for (i, word) in state.iter_mut().enumerate() {
            let mut w = [0_u8; 8];
            w.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(w);
        }
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        // xoshiro256**
        let result = self.state[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);

        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];

        self.state[2] ^= t;

        self.state[3] = self.state[3].rotate_left(45);

        result
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform value in `0..bound` (rejection sampling, no modulo bias). `bound` must be > 0.
    pub fn below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "empty range");
        let threshold = u32::MAX - (u32::MAX % bound);
        loop {
            let x = self.next_u32();
            if x < threshold {
                return x % bound;
            }
        }
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

/// Dice capability injected into a session.
pub trait Dice: fmt::Debug + Send {
    /// Two six-sided dice, each in `1..=6`.
    fn roll(&mut self) -> [u8; 2];
}

/// Fair dice driven by [`GameRng`].
#[derive(Clone, Debug)]
pub struct SeededDice {
    rng: GameRng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::seed_from_u64(seed),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&mut self) -> [u8; 2] {
        [
            self.rng.below(6) as u8 + 1,
            self.rng.below(6) as u8 + 1,
        ]
    }
}

/// Dice that replay a fixed script, then fall back to seeded rolls.
#[derive(Clone, Debug)]
pub struct ScriptedDice {
    script: VecDeque<[u8; 2]>,
    fallback: SeededDice,
}

impl ScriptedDice {
    pub fn new(script: impl IntoIterator<Item = [u8; 2]>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: SeededDice::new(0),
        }
    }

    pub fn push(&mut self, dice: [u8; 2]) {
        self.script.push_back(dice);
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> [u8; 2] {
        self.script
            .pop_front()
            .unwrap_or_else(|| self.fallback.roll())
    }
}
