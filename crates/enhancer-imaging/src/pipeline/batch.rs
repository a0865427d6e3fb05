// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-to-file enhancement and batch processing.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use enhancer_core::config::EnhancementConfig;
use enhancer_core::error::Result;
use tracing::{error, info, instrument};

use crate::pipeline::enhancer::Enhancer;

/// Output file name for `input` in a batch run.
///
/// Upscaled results are named `{stem}_{factor}x.png`, everything else
/// `enhanced_{stem}.png`. A source extension other than `png` is kept in the
/// stem (`photo.jpg` becomes `photo_2x.jpg.png`) so same-stem inputs of
/// different formats do not share an output.
pub fn output_file_name(input: &Path, config: &EnhancementConfig) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = match input.extension().map(|e| e.to_string_lossy()) {
        Some(ext) if !ext.eq_ignore_ascii_case("png") => format!(".{ext}"),
        _ => String::new(),
    };
    if config.super_resolution.is_upscale() {
        format!("{}_{}x{}.png", stem, config.super_resolution.factor(), ext)
    } else {
        format!("enhanced_{}{}.png", stem, ext)
    }
}

/// `name`, or `name` with a `-N` suffix before `.png` if already taken.
fn unique_file_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let base = name.strip_suffix(".png").unwrap_or(&name);
    let mut n = 1;
    loop {
        let candidate = format!("{base}-{n}.png");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

impl Enhancer {
    /// Enhance the file at `input` and write PNG output to `output`.
    #[instrument(
        skip_all,
        fields(input = %input.as_ref().display(), output = %output.as_ref().display())
    )]
    pub fn enhance_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        config: &EnhancementConfig,
    ) -> Result<PathBuf> {
        let data = fs::read(input.as_ref())?;
        let png = self.enhance(&data, config)?;
        fs::write(output.as_ref(), png)?;
        Ok(output.as_ref().to_path_buf())
    }

    /// Enhance every file in `inputs` into `output_dir`.
    ///
    /// The result has one entry per input, in order: the written path, or
    /// `None` if that item failed. A failing item never stops the batch.
    #[instrument(
        skip_all,
        fields(count = inputs.len(), output_dir = %output_dir.as_ref().display())
    )]
    pub fn batch_enhance<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output_dir: impl AsRef<Path>,
        config: &EnhancementConfig,
    ) -> Result<Vec<Option<PathBuf>>> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let mut taken = HashSet::new();
        let results: Vec<Option<PathBuf>> = inputs
            .iter()
            .map(|input| {
                let input = input.as_ref();
                let name = unique_file_name(output_file_name(input, config), &mut taken);
                let output = output_dir.join(name);
                match self.enhance_file(input, &output, config) {
                    Ok(path) => Some(path),
                    Err(err) => {
                        error!(input = %input.display(), error = %err, "Batch item failed");
                        None
                    }
                }
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.is_some()).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "Batch complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::processor::encode_png;
    use enhancer_core::config::SuperResolution;
    use enhancer_core::error::EnhancerError;
    use image::{GenericImageView, Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        write_sized_png(dir, name, 6, 5)
    }

    fn write_sized_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 40) as u8, (y * 50) as u8, 128])
        });
        fs::write(&path, encode_png(&img).unwrap()).unwrap();
        path
    }

    fn dimensions_of(path: &Path) -> (u32, u32) {
        image::load_from_memory(&fs::read(path).unwrap())
            .unwrap()
            .dimensions()
    }

    #[test]
    fn names_follow_upscale_factor() {
        let plain = EnhancementConfig::default();
        let doubled = plain.with_super_resolution(SuperResolution::X2);
        let input = Path::new("/photos/holiday.jpg");
        assert_eq!(output_file_name(input, &plain), "enhanced_holiday.jpg.png");
        assert_eq!(output_file_name(input, &doubled), "holiday_2x.jpg.png");

        let png = Path::new("/photos/holiday.PNG");
        assert_eq!(output_file_name(png, &doubled), "holiday_2x.png");
        assert_eq!(output_file_name(Path::new("scan"), &plain), "enhanced_scan.png");
    }

    #[test]
    fn repeated_names_get_a_suffix() {
        let mut taken = HashSet::new();
        assert_eq!(unique_file_name("a_2x.png".into(), &mut taken), "a_2x.png");
        assert_eq!(unique_file_name("a_2x.png".into(), &mut taken), "a_2x-1.png");
        assert_eq!(unique_file_name("a_2x.png".into(), &mut taken), "a_2x-2.png");
        assert_eq!(unique_file_name("b_2x.png".into(), &mut taken), "b_2x.png");
    }

    #[test]
    fn batch_outputs_never_overwrite_each_other() {
        let dir = tempfile::tempdir().unwrap();
        // Same stem, different formats.
        let jpg_named = write_sized_png(dir.path(), "photo.jpg", 4, 4);
        let png = write_sized_png(dir.path(), "photo.png", 6, 6);
        // Same file name in another directory.
        fs::create_dir(dir.path().join("other")).unwrap();
        let again = write_sized_png(&dir.path().join("other"), "photo.png", 5, 5);
        let out_dir = dir.path().join("out");

        let config = EnhancementConfig::identity().with_super_resolution(SuperResolution::X2);
        let results = Enhancer::new()
            .batch_enhance(&[jpg_named, png, again], &out_dir, &config)
            .unwrap();

        let paths: Vec<PathBuf> = results.into_iter().map(Option::unwrap).collect();
        assert_eq!(paths[0], out_dir.join("photo_2x.jpg.png"));
        assert_eq!(paths[1], out_dir.join("photo_2x.png"));
        assert_eq!(paths[2], out_dir.join("photo_2x-1.png"));
        assert_eq!(dimensions_of(&paths[0]), (8, 8));
        assert_eq!(dimensions_of(&paths[1]), (12, 12));
        assert_eq!(dimensions_of(&paths[2]), (10, 10));
    }

    #[test]
    fn enhance_file_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "in.png");
        let output = dir.path().join("out.png");
        let written = Enhancer::new()
            .enhance_file(&input, &output, &EnhancementConfig::default())
            .unwrap();
        assert_eq!(written, output);
        let bytes = fs::read(&output).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn enhance_file_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Enhancer::new()
            .enhance_file(
                dir.path().join("absent.png"),
                dir.path().join("out.png"),
                &EnhancementConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, EnhancerError::Io(_)));
    }

    #[test]
    fn batch_skips_failures_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_png(dir.path(), "first.png");
        let broken = dir.path().join("broken.png");
        fs::write(&broken, b"this is not a png").unwrap();
        let third = write_png(dir.path(), "third.png");
        let out_dir = dir.path().join("out");

        let config = EnhancementConfig::default().with_super_resolution(SuperResolution::X2);
        let results = Enhancer::new()
            .batch_enhance(&[first, broken, third], &out_dir, &config)
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_deref(), Some(out_dir.join("first_2x.png").as_path()));
        assert!(results[1].is_none());
        assert_eq!(results[2].as_deref(), Some(out_dir.join("third_2x.png").as_path()));
        assert!(out_dir.join("third_2x.png").exists());
        assert!(!out_dir.join("broken_2x.png").exists());
    }
}
