use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_raw(path: &Path, samples: &[i16]) {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    fs::write(path, bytes).expect("write raw");
}

fn read_raw(path: &Path) -> Vec<i16> {
    fs::read(path)
        .expect("read raw")
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

fn overlay_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("overlay"))
}

#[test]
fn mix_raw_replaces_base_in_silent_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("base.raw");
    let overlay = dir.path().join("overlay.raw");
    let output = dir.path().join("out.raw");
    write_raw(&base, &[1_000; 100]);
    write_raw(&overlay, &[2_000; 10]);

    overlay_cmd()
        .arg("mix-raw")
        .arg(&base)
        .arg(&overlay)
        .arg("-o")
        .arg(&output)
        .args([
            "--position-ms",
            "0",
            "--sample-rate",
            "1000",
            "--silent",
            "--gain-overlay",
            "1.0",
        ])
        .assert()
        .success();

    let mut expected = vec![2_000_i16; 10];
    expected.extend(vec![1_000_i16; 90]);
    assert_eq!(read_raw(&output), expected);
}

#[test]
fn mix_raw_blends_with_gains() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("base.raw");
    let overlay = dir.path().join("overlay.raw");
    let output = dir.path().join("out.raw");
    write_raw(&base, &[1_000; 100]);
    write_raw(&overlay, &[2_000; 10]);

    overlay_cmd()
        .arg("mix-raw")
        .arg(&base)
        .arg(&overlay)
        .arg("-o")
        .arg(&output)
        .args([
            "--position-ms",
            "0",
            "--sample-rate",
            "1000",
            "--no-silent",
            "--gain-base",
            "0.5",
            "--gain-overlay",
            "0db",
        ])
        .assert()
        .success();

    let mixed = read_raw(&output);
    assert_eq!(mixed.len(), 100);
    assert!(mixed[..10].iter().all(|&s| s == 1_250));
    assert!(mixed[10..].iter().all(|&s| s == 1_000));
}

#[test]
fn mix_raw_reads_job_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("base.raw");
    let overlay = dir.path().join("overlay.raw");
    let output = dir.path().join("out.raw");
    let job = dir.path().join("job.json");
    write_raw(&base, &[0; 12]);
    write_raw(&overlay, &[7, 8]);
    fs::write(
        &job,
        r#"{"base":"unused","overlay":"unused","output":"unused",
            "mix":{"position_ms":2,"sample_rate":1000,"loop_count":2,"silent_base":true}}"#,
    )
    .expect("write job");

    overlay_cmd()
        .arg("mix-raw")
        .arg(&base)
        .arg(&overlay)
        .arg("-o")
        .arg(&output)
        .arg("--config")
        .arg(&job)
        .assert()
        .success();

    assert_eq!(read_raw(&output), vec![0, 0, 7, 8, 7, 8, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn zero_loop_count_fails_without_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("base.raw");
    let overlay = dir.path().join("overlay.raw");
    let output = dir.path().join("out.raw");
    write_raw(&base, &[1; 4]);
    write_raw(&overlay, &[2; 4]);

    overlay_cmd()
        .arg("mix-raw")
        .arg(&base)
        .arg(&overlay)
        .arg("-o")
        .arg(&output)
        .args(["--loop", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid mix config"));

    assert!(!output.exists());
}

#[test]
fn bad_gain_names_the_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    overlay_cmd()
        .args(["mix-raw", "a.raw", "b.raw", "-o"])
        .arg(dir.path().join("out.raw"))
        .args(["--gain-overlay", "loud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--gain-overlay"));
}

#[test]
fn missing_ffmpeg_reports_decode_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("out.wav");

    overlay_cmd()
        .arg("mix")
        .arg(dir.path().join("base.wav"))
        .arg(dir.path().join("overlay.wav"))
        .arg("-o")
        .arg(&output)
        .args(["--transcoder", "ffmpeg", "--ffmpeg", "/nonexistent/overlay-ffmpeg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("decode base failed"));

    assert!(!output.exists());
}

#[cfg(feature = "native")]
mod native {
    use super::*;

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 1_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for &sample in samples {
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn mix_native_writes_wav() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("base.wav");
        let overlay = dir.path().join("overlay.wav");
        let output = dir.path().join("out.wav");
        write_wav(&base, &[1_000; 100]);
        write_wav(&overlay, &[2_000; 10]);

        overlay_cmd()
            .arg("mix")
            .arg(&base)
            .arg(&overlay)
            .arg("-o")
            .arg(&output)
            .args([
                "--transcoder",
                "native",
                "--sample-rate",
                "1000",
                "--position-ms",
                "50",
                "--overlay-trim-ms",
                "0",
            ])
            .assert()
            .success();

        let mut reader = hound::WavReader::open(&output).expect("open output");
        let samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .expect("read samples");
        assert_eq!(samples.len(), 100);
        assert!(samples[..50].iter().all(|&s| s == 1_000));
        assert!(samples[50..60].iter().all(|&s| s == 2_000));
        assert!(samples[60..].iter().all(|&s| s == 1_000));
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 3);
    }

    #[test]
    fn mismatched_rate_fails_without_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("base.wav");
        let overlay = dir.path().join("overlay.wav");
        let output = dir.path().join("out.wav");
        write_wav(&base, &[0; 10]);
        write_wav(&overlay, &[0; 10]);

        overlay_cmd()
            .arg("mix")
            .arg(&base)
            .arg(&overlay)
            .arg("-o")
            .arg(&output)
            .args(["--transcoder", "native", "--sample-rate", "44100"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("decode base failed"))
            .stderr(predicate::str::contains("does not match"));

        assert!(!output.exists());
    }

    #[test]
    fn non_wav_output_fails_without_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("base.wav");
        let overlay = dir.path().join("overlay.wav");
        let output = dir.path().join("out.mp3");
        write_wav(&base, &[0; 10]);
        write_wav(&overlay, &[0; 10]);

        overlay_cmd()
            .arg("mix")
            .arg(&base)
            .arg(&overlay)
            .arg("-o")
            .arg(&output)
            .args([
                "--transcoder",
                "native",
                "--sample-rate",
                "1000",
                "--overlay-trim-ms",
                "0",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("encode output failed"))
            .stderr(predicate::str::contains("only writes .wav"));

        assert!(!output.exists());
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 2);
    }
}
