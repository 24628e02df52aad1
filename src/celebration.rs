use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;

const BURST_SYMBOLS: [char; 6] = ['*', '+', '✦', '✧', '·', '•'];
const HEADLINES: [&str; 4] = ["NEW BEST!", "LIGHTNING!", "RAZOR SHARP!", "RECORD!"];
const GRAVITY: f64 = 15.0;

/// One spark of the new-best burst
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letters of the headline glide to a fixed slot instead of falling
    pub anchor: Option<(f64, f64)>,
}

impl Spark {
    fn loose(x: f64, y: f64, rng: &mut ThreadRng) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-4.0..4.0),
            vel_y: rng.gen_range(-5.0..-1.5),
            symbol: *BURST_SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
            anchor: None,
        }
    }

    fn letter(x: f64, y: f64, target: (f64, f64), symbol: char, rng: &mut ThreadRng) -> Self {
        Self {
            x,
            y,
            vel_x: target.0 - x,
            vel_y: target.1 - y,
            symbol,
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.5..3.5),
            anchor: Some(target),
        }
    }

    /// Advances by `dt` seconds; returns whether the spark is still alive.
    fn update(&mut self, dt: f64) -> bool {
        match self.anchor {
            Some((tx, ty)) => {
                let dist = ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt();
                if dist > 0.5 {
                    self.x += self.vel_x * dt * 2.0;
                    self.y += self.vel_y * dt * 2.0;
                    self.vel_x = tx - self.x;
                    self.vel_y = ty - self.y;
                } else {
                    self.x = tx;
                    self.y = ty;
                    self.vel_x = 0.0;
                    self.vel_y = 0.0;
                }
            }
            None => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_y += GRAVITY * dt;
            }
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Particle burst shown over the panel when a best time falls
#[derive(Debug)]
pub struct Celebration {
    pub sparks: Vec<Spark>,
    pub headline: String,
    pub is_active: bool,
    started_at: Instant,
    last_update: Instant,
    duration_secs: f64,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            sparks: Vec::new(),
            headline: String::new(),
            is_active: false,
            started_at: now,
            last_update: now,
            duration_secs: 2.5,
            width: 80.0,
            height: 24.0,
        }
    }

    /// Starts a burst centered in a `width` x `height` area.
    pub fn start(&mut self, width: u16, height: u16, best_ms: u64) {
        let mut rng = rand::thread_rng();
        let now = Instant::now();

        self.sparks.clear();
        self.started_at = now;
        self.last_update = now;
        self.is_active = true;
        self.width = width as f64;
        self.height = height as f64;

        let cx = self.width / 2.0;
        let cy = self.height / 2.0;

        let word = HEADLINES.choose(&mut rng).unwrap_or(&"NEW BEST!");
        self.headline = format!("{} {} ms", word, best_ms);

        let chars: Vec<char> = self.headline.chars().collect();
        let left = cx - chars.len() as f64 / 2.0;
        for (i, ch) in chars.into_iter().enumerate().filter(|(_, c)| *c != ' ') {
            let from_x = cx + rng.gen_range(-8.0..8.0);
            let from_y = cy + rng.gen_range(-4.0..4.0);
            let spark = Spark::letter(from_x, from_y, (left + i as f64, cy - 1.0), ch, &mut rng);
            self.sparks.push(spark);
        }

        for _ in 0..30 {
            let spark = Spark::loose(
                cx + rng.gen_range(-12.0..12.0),
                cy + rng.gen_range(-3.0..3.0),
                &mut rng,
            );
            self.sparks.push(spark);
        }
    }

    /// Advances using wall-clock time since the previous update.
    pub fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        let elapsed = now.duration_since(self.started_at).as_secs_f64();
        self.advance(dt, elapsed);
    }

    fn advance(&mut self, dt: f64, elapsed: f64) {
        if !self.is_active {
            return;
        }
        if elapsed >= self.duration_secs {
            self.is_active = false;
            self.sparks.clear();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.sparks.retain_mut(|spark| {
            let alive = spark.update(dt);
            let off_screen = spark.anchor.is_none()
                && (spark.y > height + 2.0 || spark.x < -2.0 || spark.x > width + 2.0);
            alive && !off_screen
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
