// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::{Args, Method};
use clap::Parser;
use dma2d::ThreadedDma2d;
use edgefirst_imgproc::{
    convert,
    engine::{work_buffer_words, ResizeEngine, ResizeJob, Stage, Surface},
    image::{Image, PixelFormat, Rect},
    resize::resize_crop,
};
use std::{error::Error, fs, time::Instant};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, Layer, Registry};

mod args;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let stdout_log = tracing_subscriber::fmt::layer().with_filter(level);
    let journald = match tracing_journald::layer() {
        Ok(layer) => Some(layer.with_filter(level)),
        Err(e) => {
            eprintln!("journald unavailable, logging to stdout only: {e}");
            None
        }
    };
    let subscriber = Registry::default().with(stdout_log).with(journald);

    #[cfg(feature = "tracy")]
    let subscriber = {
        if args.tracy {
            tracy_client::Client::start();
        }
        subscriber.with(args.tracy.then(|| {
            tracing_tracy::TracyLayer::new(tracing_tracy::DefaultConfig::default())
        }))
    };
    if cfg!(not(feature = "tracy")) && args.tracy {
        eprintln!("built without the tracy feature, ignoring --tracy");
    }

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    let format = PixelFormat::from(args.format);
    let src = test_pattern(args.source_size[0], args.source_size[1], format)?;
    let mut dst = Image::new(args.output_size[0], args.output_size[1], format);
    info!(
        "resizing {} -> {} with {:?}, {} iterations",
        src, dst, args.method, args.iterations
    );

    let start = Instant::now();
    match args.method.interpolation() {
        Some(method) => {
            let roi = args
                .roi()
                .unwrap_or_else(|| Rect::new(0, 0, src.width(), src.height()));
            for _ in 0..args.iterations {
                resize_crop(&src, &mut dst, roi, method)?;
            }
        }
        None => {
            debug_assert_eq!(args.method, Method::Accelerated);
            if args.roi.is_some() {
                warn!("region of interest is ignored by the accelerated resize");
            }
            accelerated(&src, &mut dst, &args)?;
        }
    }
    let elapsed = start.elapsed();
    info!(
        "{} resizes in {:?} ({:?} per resize)",
        args.iterations,
        elapsed,
        elapsed / args.iterations.max(1)
    );

    if let Some(path) = &args.output_path {
        fs::write(path, dst.as_bytes())?;
        info!("wrote {} to {}", dst, path.display());
    }
    Ok(())
}

/// Runs the two-pass resize on the worker-thread accelerator emulation.
fn accelerated(src: &Image, dst: &mut Image, args: &Args) -> Result<(), Box<dyn Error>> {
    let source = Surface::try_from(src)?;
    let output = Surface::try_from(&mut *dst)?;
    let mut work = vec![0u32; work_buffer_words(source.width, output.height)];
    let job = ResizeJob::new(source, output, &mut work);

    // dropped before work, joining the accelerator thread
    let (port, line) = ThreadedDma2d::new()?;
    let mut engine = ResizeEngine::new(port).with_callback(|stage| debug!("resize {:?}", stage));

    for _ in 0..args.iterations {
        // SAFETY: src, dst and work outlive the job, which `service` drives to
        // completion or fails and `settle` waits out before returning.
        let stage = unsafe { engine.setup(&job)? };
        if stage != Stage::SetupDone {
            return Err(format!("resize engine not ready: {stage:?}").into());
        }
        if let Err(err) = engine.service(&line, args.watchdog()) {
            // the abandoned transfer may still be writing dst or work
            if let Err(lost) = engine.settle(&line, args.watchdog() * 10) {
                warn!("accelerator did not settle: {}", lost);
            }
            return Err(err.into());
        }
    }
    Ok(())
}

/// Diagonal RGB gradient converted to `format`.
fn test_pattern(width: u32, height: u32, format: PixelFormat) -> Result<Image, Box<dyn Error>> {
    let mut rgb = Image::new(width, height, PixelFormat::Rgb888);
    let stride = rgb.row_stride();
    if stride > 0 {
        for (y, row) in rgb.as_bytes_mut().chunks_exact_mut(stride).enumerate() {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                px[0] = (x * 255 / width as usize) as u8;
                px[1] = (y * 255 / height as usize) as u8;
                px[2] = ((x + y) * 255 / (width + height) as usize) as u8;
            }
        }
    }

    let mut image = Image::new(width, height, format);
    convert::convert(&rgb, &mut image)?;
    Ok(image)
}
