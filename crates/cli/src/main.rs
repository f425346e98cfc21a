use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use native_decoder::{
    sdk, CodecType, ColorFormat, DecoderConfig, DeviceDescriptor, DeviceVerdict,
    HardwareVideoDecoderFactory, PlatformInfo, SelectionPolicy, SnapshotRegistry,
    VideoDecoder, VideoDecoderFactory,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use video_track::{LocalVideoSource, PixelFormat, VideoFrame, VideoSink, VideoTrack};

#[derive(Parser)]
#[command(name = "codec-probe")]
#[command(about = "Inspect hardware video decoder selection against a codec registry snapshot")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Registry snapshot (JSON); a built-in sample device list is used if omitted
    #[arg(short, long, global = true)]
    registry: Option<PathBuf>,

    /// Selection policy (JSON); missing fields take the defaults
    #[arg(short, long, global = true)]
    policy: Option<PathBuf>,

    /// Platform SDK level, overriding the one recorded in the snapshot
    #[arg(long, global = true)]
    sdk: Option<u32>,

    /// Use the restrictive H264 vendor list instead of allowing every vendor
    #[arg(long, global = true)]
    strict_h264: bool,

    /// Disable the software decoder fallback
    #[arg(long, global = true)]
    no_fallback: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which decoder a codec would get
    Select {
        /// Codec name (H264, VP8, VP9)
        #[arg(short, long)]
        codec: String,
    },

    /// List supported codec configurations in preference order
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the verdict for every registry entry for a codec
    Explain {
        /// Codec name (H264, VP8, VP9)
        #[arg(short, long)]
        codec: String,
    },

    /// Attach sinks to an in-process track, pump frames, then tear down
    TrackDemo {
        /// Number of sinks to attach
        #[arg(long, default_value = "3")]
        sinks: usize,

        /// Frames to deliver
        #[arg(long, default_value = "30")]
        frames: usize,

        /// Frame width
        #[arg(long, default_value = "64")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "48")]
        height: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Select { ref codec } => {
            let factory = build_factory(&cli)?;
            select_command(&factory, codec)?;
        }
        Commands::List { json } => {
            let factory = build_factory(&cli)?;
            list_command(&factory, json)?;
        }
        Commands::Explain { ref codec } => {
            let factory = build_factory(&cli)?;
            explain_command(&factory, codec)?;
        }
        Commands::TrackDemo {
            sinks,
            frames,
            width,
            height,
        } => {
            track_demo_command(sinks, frames, width, height)?;
        }
    }

    Ok(())
}

fn build_factory(cli: &Cli) -> Result<HardwareVideoDecoderFactory> {
    let snapshot = match &cli.registry {
        Some(path) => SnapshotRegistry::load(path)?,
        None => {
            info!("No registry snapshot given, using the built-in sample devices");
            sample_registry()
        }
    };

    let mut policy = match &cli.policy {
        Some(path) => SelectionPolicy::load(path)?,
        None => SelectionPolicy::default(),
    };
    if cli.strict_h264 {
        policy.h264 = SelectionPolicy::strict_h264().h264;
    }

    let platform = cli
        .sdk
        .map(PlatformInfo::new)
        .or_else(|| snapshot.platform())
        .unwrap_or_else(|| PlatformInfo::new(sdk::M));
    info!(
        "Platform SDK {} ({} registry entries)",
        platform.sdk_version,
        snapshot.codecs.len()
    );

    let config = DecoderConfig {
        fallback_to_software: !cli.no_fallback,
        policy,
        shared_context: None,
    };
    Ok(HardwareVideoDecoderFactory::with_config(
        Arc::new(snapshot),
        platform,
        config,
    ))
}

fn sample_registry() -> SnapshotRegistry {
    let planar = [ColorFormat::YUV420_PLANAR, ColorFormat::YUV420_SEMI_PLANAR];
    let mut registry = SnapshotRegistry::from_devices([
        DeviceDescriptor::encoder("OMX.qcom.video.encoder.avc")
            .with_type(CodecType::H264.mime_type(), planar),
        DeviceDescriptor::decoder("OMX.qcom.video.decoder.avc")
            .with_type(CodecType::H264.mime_type(), planar),
        DeviceDescriptor::decoder("OMX.qcom.video.decoder.vp8")
            .with_type(CodecType::Vp8.mime_type(), [ColorFormat::QCOM_YUV420_SEMI_PLANAR]),
        DeviceDescriptor::decoder("OMX.google.vp9.decoder")
            .with_type(CodecType::Vp9.mime_type(), [ColorFormat::YUV420_PLANAR]),
    ]);
    registry.sdk_version = Some(sdk::M);
    registry
}

fn parse_codec(name: &str) -> Result<CodecType> {
    name.parse::<CodecType>()
        .with_context(|| format!("expected one of H264, VP8, VP9, got {name:?}"))
}

fn select_command(factory: &HardwareVideoDecoderFactory, codec: &str) -> Result<()> {
    let codec = parse_codec(codec)?;
    match factory.create_decoder(codec.name())? {
        Some(decoder) => {
            println!("{}", factory.describe_decoder(codec));
            info!(
                "Created {} decoder {} (hardware: {})",
                decoder.codec_type(),
                decoder.implementation_name(),
                decoder.is_hardware()
            );
        }
        None => {
            warn!("No decoder available for {}", codec);
            println!("none");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CodecListing {
    name: String,
    params: std::collections::BTreeMap<String, String>,
    decoder: String,
}

fn list_command(factory: &HardwareVideoDecoderFactory, json: bool) -> Result<()> {
    let codecs = factory.supported_codecs();
    if json {
        let listing: Vec<CodecListing> = codecs
            .iter()
            .map(|info| CodecListing {
                name: info.name.clone(),
                params: info.params.clone(),
                decoder: info
                    .codec_type()
                    .map(|codec| factory.describe_decoder(codec))
                    .unwrap_or_else(|| "none".to_string()),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if codecs.is_empty() {
        println!("No decoders available.");
        return Ok(());
    }
    println!("Supported codecs:");
    for info in &codecs {
        println!("  - {}", info);
    }
    Ok(())
}

fn explain_command(factory: &HardwareVideoDecoderFactory, codec: &str) -> Result<()> {
    let codec = parse_codec(codec)?;
    let selector = factory.selector();
    if !selector.hardware_decode_available() {
        println!(
            "Hardware decoding unavailable below SDK {} (platform is {})",
            selector.policy().min_sdk_version,
            selector.platform().sdk_version
        );
    }

    println!("{} ({}):", codec, codec.mime_type());
    for verdict in selector.explain(codec) {
        match verdict {
            DeviceVerdict::Unreadable { index, error } => {
                println!("  [{index}] unreadable: {error}");
            }
            DeviceVerdict::Rejected {
                index,
                name,
                reason,
            } => {
                println!("  [{index}] {name}: rejected, {reason}");
            }
            DeviceVerdict::Accepted {
                index,
                name,
                color_format,
            } => {
                println!("  [{index}] {name}: accepted, {color_format}");
            }
        }
    }
    println!("=> {}", factory.describe_decoder(codec));
    Ok(())
}

#[derive(Default)]
struct CountingSink {
    frames: AtomicUsize,
}

impl VideoSink for CountingSink {
    fn on_frame(&self, _frame: &VideoFrame) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

fn track_demo_command(sinks: usize, frames: usize, width: u32, height: u32) -> Result<()> {
    let source = Arc::new(LocalVideoSource::new());
    let mut track = VideoTrack::new(source.clone());
    info!("Created {} track {}", track.kind(), track.id());

    let counters: Vec<Arc<CountingSink>> =
        (0..sinks).map(|_| Arc::new(CountingSink::default())).collect();
    for counter in &counters {
        track.add_sink(counter.clone())?;
    }

    let (tx, rx) = crossbeam_channel::bounded(4);
    let pump = source
        .spawn_pump(rx)
        .context("failed to start delivery thread")?;

    let half = frames / 2;
    for i in 0..frames {
        if i == half {
            if let Some(first) = counters.first() {
                let first: Arc<dyn VideoSink> = first.clone();
                track.remove_sink(&first);
                info!("Detached sink 0 after {} frames", half);
            }
        }
        let frame = VideoFrame::blank(PixelFormat::I420, width, height, i as i64 * 33_333_333);
        tx.send(frame).context("delivery thread exited early")?;
    }
    drop(tx);

    let delivered = pump
        .join()
        .map_err(|_| anyhow::anyhow!("delivery thread panicked"))?;
    track.dispose();

    for (i, counter) in counters.iter().enumerate() {
        println!("  sink {}: {} frames", i, counter.frames.load(Ordering::Relaxed));
    }
    println!(
        "Delivered {} frames to sinks; {} native sinks still allocated",
        delivered,
        source.allocated_sinks()
    );
    Ok(())
}
