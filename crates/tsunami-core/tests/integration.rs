//! Integration tests for tsunami-core.
//!
//! Walks the rate → divisor → chain path the processing thread takes, using
//! a sine capture and checking sample-level output.

use std::sync::Arc;
use std::thread;

use tsunami_core::{
    BLOCK_SIZE, NATIVE_RATE, RateControl, ShapeRule, TsunamiEngine, WaveShaper, decimate,
    repeat_expand,
};

/// 16-bit sine at `freq_hz`, half scale.
fn sine_block(freq_hz: f32, len: usize) -> Vec<i16> {
    (0..len)
        .map(|n| {
            let phase = core::f32::consts::TAU * freq_hz * n as f32 / NATIVE_RATE as f32;
            (phase.sin() * 16_384.0) as i16
        })
        .collect()
}

#[test]
fn sixteen_khz_block_walkthrough() {
    let rate = RateControl::new(16_000);
    let d = rate.divisor();
    assert_eq!(d, 3);

    let input = sine_block(440.0, BLOCK_SIZE);
    let low = decimate(&input, d);
    assert_eq!(low.len(), 342);

    let shaped = WaveShaper::new().shape(&low);
    assert_eq!(shaped, low, "literal rule leaves samples untouched");

    let high = repeat_expand(&shaped, d);
    assert_eq!(high.len(), 1026);
    assert_ne!(high.len(), input.len());

    let mut engine = TsunamiEngine::new(BLOCK_SIZE);
    let mut output = vec![0i16; BLOCK_SIZE];
    assert_eq!(engine.process_block(&input, d, &mut output), 1026);
    assert_eq!(output[..], high[..BLOCK_SIZE]);
}

#[test]
fn rate_change_between_blocks_takes_effect_next_block() {
    let rate = RateControl::new(48_000);
    let mut engine = TsunamiEngine::new(BLOCK_SIZE);
    let input = sine_block(1000.0, BLOCK_SIZE);
    let mut output = vec![0i16; BLOCK_SIZE];

    engine.process_block(&input, rate.divisor(), &mut output);
    assert_eq!(output, input);

    rate.set(12_000).unwrap();
    engine.process_block(&input, rate.divisor(), &mut output);
    assert_eq!(output[0..4], [input[0]; 4]);
    assert_eq!(output[4..8], [input[4]; 4]);
}

#[test]
fn lowest_rate_holds_first_sample_for_whole_block() {
    let rate = RateControl::new(10);
    let input = sine_block(440.0, BLOCK_SIZE);
    let mut engine = TsunamiEngine::new(BLOCK_SIZE);
    let mut output = vec![0i16; BLOCK_SIZE];

    let expanded = engine.process_block(&input, rate.divisor(), &mut output);
    assert_eq!(expanded, 4800);
    assert!(output.iter().all(|&s| s == input[0]));
}

#[test]
fn opt_in_rule_boosts_every_sixteenth_low_rate_sample() {
    let rule: ShapeRule = "16:15:2".parse().unwrap();
    let mut engine = TsunamiEngine::with_shaper(64, WaveShaper::with_rule(rule));
    let input = vec![1000i16; 64];
    let mut output = vec![0i16; 64];
    engine.process_block(&input, 2, &mut output);

    // low-rate index 15 covers output samples 30 and 31
    for (i, &s) in output.iter().enumerate() {
        let expected = if i == 30 || i == 31 { 2000 } else { 1000 };
        assert_eq!(s, expected, "sample {i}");
    }
}

#[test]
fn concurrent_reader_never_sees_out_of_range_rate() {
    let rate = Arc::new(RateControl::default());
    let writer_rate = Arc::clone(&rate);

    let writer = thread::spawn(move || {
        for i in 0..20_000i64 {
            // alternate valid and invalid updates
            let _ = writer_rate.set(if i % 2 == 0 { 10 + i } else { -i });
        }
    });

    for _ in 0..20_000 {
        let r = rate.get();
        assert!((10..=48_000).contains(&r), "observed {r}");
        assert!(rate.divisor() >= 1);
    }
    writer.join().unwrap();
}
