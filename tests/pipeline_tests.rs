//! End-to-end tests for the contour pipeline.

use isomarch::io::{load_contour_patterns, read_image, save_contour_patterns, write_image};
use isomarch::prelude::*;

/// Deterministic pseudo-random test image.
fn noise(width: usize, height: usize, seed: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        let mut h = (x as u32).wrapping_mul(73_856_093)
            ^ (y as u32).wrapping_mul(19_349_663)
            ^ seed;
        h ^= h >> 13;
        h = h.wrapping_mul(0x5bd1_e995);
        Rgb::new(h as u8, (h >> 8) as u8, (h >> 16) as u8)
    })
}

/// Patterns where configuration `k` is a solid fill of a gray that encodes `k`.
fn labelled(step: usize) -> ContourPatterns {
    ContourPatterns::solid(step, step, |k| Rgb::gray(100 + k as u8)).unwrap()
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_output_identical_across_thread_counts() {
    let config = PipelineConfig::new().with_sigma(127);
    let patterns = ContourPatterns::generate(config.step_x, config.step_y).unwrap();
    let image = noise(61, 45, 7);

    let outputs: Vec<RunOutput> = [1, 4, 16]
        .iter()
        .map(|&t| PhaseOrchestrator::new(config, t).unwrap().run(image.clone(), &patterns).unwrap())
        .collect();

    for output in &outputs[1..] {
        assert_eq!(output.image, outputs[0].image);
        assert_eq!(output.grid, outputs[0].grid);
    }
}

#[test]
fn test_rescaled_output_identical_across_thread_counts() {
    let config = PipelineConfig::new()
        .with_step(4, 4)
        .with_rescale_threshold(40, 40)
        .with_rescale_target(50, 34);
    let patterns = labelled(4);
    let image = noise(64, 48, 11);

    let single = run(image.clone(), &patterns, 1, config).unwrap();
    for threads in [3, 4, 16] {
        assert_eq!(run(image.clone(), &patterns, threads, config).unwrap(), single);
    }
}

// ============================================================================
// Rescale trigger
// ============================================================================

#[test]
fn test_oversized_input_produces_target_dimensions() {
    let config = PipelineConfig::new()
        .with_step(4, 4)
        .with_rescale_threshold(32, 32)
        .with_rescale_target(24, 16);
    let patterns = labelled(4);

    let wide = run(noise(33, 10, 1), &patterns, 2, config).unwrap();
    assert_eq!(wide.dimensions(), Dimensions::new(24, 16));

    let tall = run(noise(5, 40, 2), &patterns, 2, config).unwrap();
    assert_eq!(tall.dimensions(), Dimensions::new(24, 16));
}

#[test]
fn test_input_within_threshold_keeps_dimensions() {
    let config = PipelineConfig::new()
        .with_step(4, 4)
        .with_rescale_threshold(32, 32)
        .with_rescale_target(24, 16);
    let output = PhaseOrchestrator::new(config, 2)
        .unwrap()
        .run(noise(32, 32, 3), &labelled(4))
        .unwrap();
    assert_eq!(output.image.dimensions(), Dimensions::new(32, 32));
    assert!(!output.stats.rescaled);
}

#[test]
fn test_rescaled_pixels_outside_stamped_cells() {
    // 8x8 vertical gradient rescaled to 5x5. One 4x4 cell is stamped; the
    // last row and column keep the bicubic values.
    let config = PipelineConfig::new()
        .with_step(4, 4)
        .with_rescale_threshold(6, 6)
        .with_rescale_target(5, 5);
    let image = PixelBuffer::from_fn(8, 8, |_, y| Rgb::gray(10 * y as u8));
    let output = run(image, &labelled(4), 3, config).unwrap();

    let column: Vec<Rgb> = (0..5).map(|y| output.get(4, y)).collect();
    assert_eq!(column, [0, 15, 35, 55, 70].map(Rgb::gray));
    assert!((0..5).all(|x| output.get(x, 4) == Rgb::gray(70)));
    // Every rescaled sample is darker than the default sigma.
    assert_eq!(output.get(2, 2), Rgb::gray(115));
}

// ============================================================================
// Boundary policy
// ============================================================================

#[test]
fn test_last_grid_column_uses_last_image_column() {
    // Only x = 16 is dark; no interior sample lands there.
    let image = PixelBuffer::from_fn(17, 16, |x, _| {
        if x == 16 {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    });
    let output = PhaseOrchestrator::new(PipelineConfig::default(), 2)
        .unwrap()
        .run(image, &labelled(8))
        .unwrap();

    for row in 0..output.grid.rows() {
        assert_eq!(output.grid.row(row), &[0, 0, 1]);
    }
    // Cells in column 1 see their right corners set: 4 + 2.
    assert_eq!(output.image.get(3, 5), Rgb::gray(100));
    assert_eq!(output.image.get(12, 9), Rgb::gray(106));
    // The partial column past the last full cell keeps the input pixels.
    assert_eq!(output.image.get(16, 4), Rgb::BLACK);
}

#[test]
fn test_last_grid_row_uses_last_image_row() {
    let image = PixelBuffer::from_fn(16, 17, |_, y| {
        if y == 16 {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    });
    let output = PhaseOrchestrator::new(PipelineConfig::default(), 3)
        .unwrap()
        .run(image, &labelled(8))
        .unwrap();

    assert_eq!(output.grid.row(0), &[0, 0, 0]);
    assert_eq!(output.grid.row(1), &[0, 0, 0]);
    assert_eq!(output.grid.row(2), &[1, 1, 1]);
    assert_eq!(output.image.get(0, 0), Rgb::gray(100));
    assert_eq!(output.image.get(15, 15), Rgb::gray(103));
}

#[test]
fn test_corner_uses_last_pixel() {
    let image = PixelBuffer::from_fn(16, 16, |x, y| {
        if (x, y) == (15, 15) {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    });
    let output = PhaseOrchestrator::new(PipelineConfig::default(), 4)
        .unwrap()
        .run(image, &labelled(8))
        .unwrap();
    assert_eq!(output.grid.count_set(), 1);
    assert_eq!(output.grid.get(2, 2), 1);
    assert_eq!(output.image.get(12, 12), Rgb::gray(102));
}

// ============================================================================
// Concrete scenario
// ============================================================================

#[test]
fn test_black_square_tiles_full_pattern() {
    let config = PipelineConfig::new().with_step(8, 8).with_sigma(128);
    let patterns = ContourPatterns::generate(8, 8).unwrap();
    let image = PixelBuffer::try_filled(16, 16, Rgb::BLACK).unwrap();

    let mut images = Vec::new();
    for threads in [1, 4] {
        let output = PhaseOrchestrator::new(config, threads)
            .unwrap()
            .run(image.clone(), &patterns)
            .unwrap();
        assert_eq!((output.grid.rows(), output.grid.cols()), (3, 3));
        assert!(output.grid.cells().iter().all(|&c| c == 1));
        images.push(output.image);
    }

    let full = patterns.get(15);
    let expected = PixelBuffer::from_fn(16, 16, |x, y| full.get(x % 8, y % 8));
    assert_eq!(images[0], expected);
    assert_eq!(images[1], expected);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_zero_threads_rejected() {
    let err = run(noise(8, 8, 0), &labelled(8), 0, PipelineConfig::default()).unwrap_err();
    assert_eq!(err, PipelineError::InvalidThreadCount(0));
}

#[test]
fn test_wrong_pattern_size_rejected() {
    let err = run(noise(16, 16, 0), &labelled(4), 2, PipelineConfig::default()).unwrap_err();
    assert!(err.is_precondition());
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_file_to_file_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.ppm");
    let output = dir.path().join("out.ppm");
    let contours = dir.path().join("contours");

    let config = PipelineConfig::new().with_step(4, 4);
    save_contour_patterns(&ContourPatterns::generate(4, 4).unwrap(), &contours).unwrap();
    write_image(&noise(30, 22, 5), &input).unwrap();

    let patterns = load_contour_patterns(&contours).unwrap();
    let result = run(read_image(&input).unwrap(), &patterns, 3, config).unwrap();
    write_image(&result, &output).unwrap();

    let reread = read_image(&output).unwrap();
    assert_eq!(reread, result);
    assert_eq!(reread, run(noise(30, 22, 5), &patterns, 1, config).unwrap());
}

#[test]
fn test_config_file_drives_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("isomarch.toml");
    std::fs::write(&path, "step_x = 4\nstep_y = 4\nsigma = 10\n").unwrap();

    let config = PipelineConfig::from_toml_file(&path).unwrap();
    assert_eq!(config.cell_size(), Dimensions::new(4, 4));
    let image = PixelBuffer::try_filled(8, 8, Rgb::gray(50)).unwrap();
    let output = PhaseOrchestrator::new(config, 2).unwrap().run(image, &labelled(4)).unwrap();
    // Every sample is lighter than sigma.
    assert_eq!(output.grid.count_set(), 0);
}
