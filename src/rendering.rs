// Holds the grid sweep: iteration counts over a square of integer pairs,
// spread across worker threads, and the logic that turns them into pixels
pub use drawing::{draw_pixel, heatmap_pixels, Pixel};
pub use render_backend::{sweep, GridSweep, IterationGrid};

pub const DEFAULT_RADIUS: i64 = 100;
/// Largest radius a sweep accepts, about half a gigabyte of counts
pub const MAX_RADIUS: i64 = 4096;

mod drawing {
    use super::render_backend::IterationGrid;

    pub type Pixel = (u8, u8, u8, u8);

    // Dark purple through teal to yellow
    const STOPS: [(f64, f64, f64); 5] = [
        (68., 1., 84.),
        (59., 82., 139.),
        (33., 145., 140.),
        (94., 201., 98.),
        (253., 231., 37.),
    ];

    /// Colours one cell, given its iteration count and the range of counts on the grid
    pub fn draw_pixel(count: u64, min: u64, max: u64) -> Pixel {
        let v = if max > min {
            (count.saturating_sub(min)) as f64 / (max - min) as f64
        } else {
            0.
        };
        let scaled = v.min(1.) * (STOPS.len() - 1) as f64;
        let ind = (scaled.floor() as usize).min(STOPS.len() - 2);
        let frac = scaled - ind as f64;
        let (r0, g0, b0) = STOPS[ind];
        let (r1, g1, b1) = STOPS[ind + 1];
        let mix = |lo: f64, hi: f64| (lo + (hi - lo) * frac).round() as u8;
        (mix(r0, r1), mix(g0, g1), mix(b0, b1), 255)
    }

    /// RGBA bytes, row by row, with cell `[row][col]` at pixel `(col, row)`
    pub fn heatmap_pixels(grid: &IterationGrid) -> Vec<u8> {
        let (min, max) = grid.range();
        let mut pixels = Vec::with_capacity(grid.side() * grid.side() * 4);
        for row in &grid.cells {
            for &count in row {
                let (r, g, b, a) = draw_pixel(count, min, max);
                pixels.extend_from_slice(&[r, g, b, a]);
            }
        }
        pixels
    }
}

mod render_backend {
    use crate::error::Error;
    use crate::logic::{Decomposer, DEFAULT_MAX_MAGNITUDE};
    use crate::numbers::signed_sqrt;
    use serde::{Deserialize, Serialize};
    use std::fs::File;
    use std::io::{BufReader, BufWriter};
    use std::path::Path;
    use std::thread;
    use std::time::Instant;
    use tracing::{debug, info};

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GridSweep {
        pub radius: i64,
        pub max_magnitude: f64,
        pub workers: usize,
    }

    impl Default for GridSweep {
        fn default() -> Self {
            GridSweep {
                radius: super::DEFAULT_RADIUS,
                max_magnitude: DEFAULT_MAX_MAGNITUDE,
                workers: num_cpus::get(),
            }
        }
    }

    /// Iteration counts for every `(x, y)` with `|x|, |y| <= radius`.
    /// Cell `[x + radius][radius - y]` holds the count for `(x, y)`.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct IterationGrid {
        pub radius: i64,
        pub max_magnitude: f64,
        pub cells: Vec<Vec<u64>>,
    }

    impl IterationGrid {
        pub fn side(&self) -> usize {
            self.cells.len()
        }

        pub fn get(&self, x: i64, y: i64) -> Option<u64> {
            if x.abs() > self.radius || y.abs() > self.radius {
                return None;
            }
            let row = (x + self.radius) as usize;
            let col = (self.radius - y) as usize;
            self.cells.get(row)?.get(col).copied()
        }

        pub fn range(&self) -> (u64, u64) {
            let mut cells = self.cells.iter().flatten().copied();
            let first = cells.next().unwrap_or(0);
            cells.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)))
        }

        pub fn write_json(&self, path: &Path) -> Result<(), Error> {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, self)?;
            Ok(())
        }

        pub fn read_json(path: &Path) -> Result<Self, Error> {
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }

        #[cfg(feature = "heatmap")]
        pub fn save_heatmap(&self, path: &Path) -> Result<(), Error> {
            use sdl2::pixels::PixelFormatEnum;
            use sdl2::surface::Surface;

            let side = self.side() as u32;
            let mut pixels = super::drawing::heatmap_pixels(self);
            // ABGR8888 is R, G, B, A in memory on little endian targets
            let surface =
                Surface::from_data(&mut pixels, side, side, side * 4, PixelFormatEnum::ABGR8888)
                    .map_err(Error::Render)?;
            surface.save_bmp(path).map_err(Error::Render)
        }
    }

    /// Iteration count for one grid cell. The diagonal would hand the search
    /// the sum of two equal roots, which it walks past, so it is pinned to 1.
    pub fn cell(decomposer: &Decomposer, x: i64, y: i64) -> Result<u64, Error> {
        if x == y {
            return Ok(1);
        }
        let n = signed_sqrt(x as f64) + signed_sqrt(y as f64);
        Ok(decomposer.search(n)?.iterations)
    }

    /// Fills the whole grid, one band of rows per worker
    pub fn sweep(config: &GridSweep) -> Result<IterationGrid, Error> {
        if config.radius <= 0 || config.radius > super::MAX_RADIUS {
            return Err(Error::InvalidRadius(config.radius));
        }
        let decomposer = Decomposer::new(config.max_magnitude)?;
        let side = (2 * config.radius + 1) as usize;
        let workers = config.workers.clamp(1, side);
        let rows_per_worker = (side + workers - 1) / workers;
        let mut buffer = vec![0u64; side * side];

        let now = Instant::now();
        start_threads(&mut buffer, rows_per_worker * side, side, config.radius, &decomposer)?;
        info!(
            side,
            workers,
            elapsed = ?now.elapsed(),
            "grid sweep finished"
        );

        let cells = buffer.chunks(side).map(|row| row.to_vec()).collect();
        Ok(IterationGrid {
            radius: config.radius,
            max_magnitude: config.max_magnitude,
            cells,
        })
    }

    fn start_threads(
        buffer: &mut [u64],
        split: usize,
        pitch: usize,
        radius: i64,
        decomposer: &Decomposer,
    ) -> Result<(), Error> {
        thread::scope(|scope| {
            let handles: Vec<_> = buffer
                .chunks_mut(split)
                .enumerate()
                .map(|(i, slice)| {
                    let ind = i * split;
                    scope.spawn(move || draw_func(slice, decomposer, ind, pitch, radius))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| Error::WorkerPanicked)?)
                .collect::<Result<(), Error>>()
        })
    }

    fn draw_func(
        slice: &mut [u64],
        decomposer: &Decomposer,
        ind: usize,
        pitch: usize,
        radius: i64,
    ) -> Result<(), Error> {
        for (i, out) in slice.iter_mut().enumerate() {
            let total_ind = i + ind;
            let x = (total_ind / pitch) as i64 - radius;
            let y = radius - (total_ind % pitch) as i64;
            *out = cell(decomposer, x, y)?;
        }
        debug!(start = ind, cells = slice.len(), "worker done");
        Ok(())
    }
}
