/// Deterministic PRNG with 48-bit state (three 16-bit words), suitable for
/// snapshots and lockstep verification.
///
/// The add/xor/rotate recurrence and its draw sequence are part of
/// saved-game compatibility and must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameRng {
    state: [u16; 3],
}

impl GameRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        let mut sm = SplitMix64 { state: seed };
        let word = sm.next();
        let mut state = [word as u16, (word >> 16) as u16, (word >> 32) as u16];
        // All-zero state is a fixed point of the recurrence.
        if state == [0; 3] {
            state[0] = 1;
        }
        Self { state }
    }

    pub fn state_bytes(&self) -> [u8; 6] {
        let mut out = [0_u8; 6];
        for (i, word) in self.state.iter().enumerate() {
            out[i * 2..(i + 1) * 2].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub fn from_state_bytes(bytes: [u8; 6]) -> Self {
        let mut state = [0_u16; 3];
        for (i, word) in state.iter_mut().enumerate() {
            let mut w = [0_u8; 2];
            w.copy_from_slice(&bytes[i * 2..(i + 1) * 2]);
            *word = u16::from_le_bytes(w);
        }
        Self { state }
    }

    pub fn next_u16(&mut self) -> u16 {
        let [s0, s1, s2] = self.state;
        let result = s0.wrapping_add(s1) ^ s2;
        let s2 = s2.wrapping_add(s1);
        let s1 = (s1 ^ s2).rotate_right(1);
        self.state = [result, s1, s2.rotate_right(1)];
        result
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
