//! Per-session participant colors.
//!
//! Every non-blank name maps to one color for the lifetime of a session. The
//! color is derived from the name alone, so two sessions agree on it too, but
//! the cache is what the presentation layer reads: it lists exactly the
//! participants seen so far.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Scale applied to each channel of a derived color.
const DARKEN_FACTOR: f64 = 0.7;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Color used for blank names.
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Each channel scaled by [`DARKEN_FACTOR`].
    pub fn darker(self) -> Self {
        let scale = |c: u8| (f64::from(c) * DARKEN_FACTOR) as u8;
        Self { r: scale(self.r), g: scale(self.g), b: scale(self.b) }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Shared name-to-color cache. Clones share one map.
#[derive(Debug, Clone, Default)]
pub struct ColorCache {
    colors: Arc<Mutex<BTreeMap<String, Rgb>>>,
}

impl ColorCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `name`, assigning and caching it on first sight.
    ///
    /// Blank names are black and never cached.
    pub fn color_for(&self, name: &str) -> Rgb {
        if name.trim().is_empty() {
            return Rgb::BLACK;
        }
        *self.lock().entry(name.to_string()).or_insert_with(|| derive_color(name))
    }

    /// Cached color for `name`, if it has been seen.
    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.lock().get(name).copied()
    }

    /// Names seen so far, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no name has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Rgb>> {
        self.colors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stable 31-multiplier string hash, so the seed does not depend on the
/// standard library's randomized hasher.
fn name_seed(name: &str) -> u64 {
    name.encode_utf16().fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
        as u32 as u64
}

fn derive_color(name: &str) -> Rgb {
    let mut rng = ChaCha8Rng::seed_from_u64(name_seed(name));
    let [r, g, b, _] = rng.next_u32().to_le_bytes();
    Rgb::new(r, g, b).darker()
}
