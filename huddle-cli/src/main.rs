use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use colored::*;
use dialoguer::Input;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use huddle_client::{RtcConfig, RtcConnection, RtcSession, SignalingClient, WsTransport};
use huddle_core::{ActionKind, Claims, EventKind, PcKind, RoleKind};

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Join a huddle room from the terminal")]
struct Cli {
    /// Signaling relay endpoint
    #[arg(long, default_value = "ws://localhost:8443/ws")]
    url: String,

    /// Room to join
    #[arg(long)]
    room: String,

    /// Display name; prompted for when omitted
    #[arg(long)]
    name: Option<String>,

    /// host | guest
    #[arg(long, default_value = "guest")]
    role: String,

    /// Seconds to wait for both connections
    #[arg(long, default_value_t = 15)]
    connect_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let name = match cli.name {
        Some(name) => name,
        None => Input::new().with_prompt("Display name").interact_text()?,
    };
    let role = match cli.role.as_str() {
        "host" => RoleKind::Host,
        "guest" => RoleKind::Guest,
        other => bail!("unknown role '{other}', expected host or guest"),
    };
    let claims = Claims {
        name,
        id: Uuid::new_v4().to_string(),
        room_id: cli.room,
        role,
    };

    println!(
        "{} {} joining room {}",
        "huddle".green().bold(),
        claims.name.as_str().bold(),
        claims.room_id.as_str().cyan()
    );

    let signaling = SignalingClient::new(cli.url.clone(), Arc::new(WsTransport));
    if !signaling.wait_until_open(Duration::from_secs(10)).await {
        bail!("could not reach the signaling relay at {}", cli.url);
    }

    let (ended_tx, mut ended_rx) = mpsc::unbounded_channel();
    let events = signaling.on_event(move |ev| {
        println!("{} {:?} from {}", "event".cyan(), ev.kind, ev.peer_id);
        if ev.kind == EventKind::RoomEnded {
            let _ = ended_tx.send(());
        }
    });

    let config = RtcConfig::default();
    let publisher = Arc::new(RtcConnection::new(PcKind::Pub, &config).await?);
    let subscriber = Arc::new(RtcConnection::new(PcKind::Sub, &config).await?);

    subscriber.on_remote_track(|track| {
        println!("{} {} track", "remote".magenta(), track.kind());
    });

    let session = RtcSession::new(publisher, subscriber, signaling.clone());
    session.start(&synthetic_tracks()).await?;
    signaling.send_action(&claims, ActionKind::Join);

    let ready = session
        .wait_until_both_connected(Duration::from_secs(cli.connect_timeout))
        .await;
    if !ready {
        session.close().await;
        bail!("connections did not come up within {}s", cli.connect_timeout);
    }
    println!("{}", "both connections live".green().bold());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = ended_rx.recv() => println!("{}", "room ended by host".yellow()),
    }

    signaling.send_action(&claims, ActionKind::Leave);
    events.dispose();
    session.close().await;
    Ok(())
}

// Placeholder media: the capture side is outside this binary, but the
// publisher leg still needs registered tracks to negotiate against.
fn synthetic_tracks() -> Vec<Arc<dyn TrackLocal + Send + Sync>> {
    let audio = Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            ..Default::default()
        },
        "audio".to_owned(),
        "huddle".to_owned(),
    ));
    let video = Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            ..Default::default()
        },
        "video".to_owned(),
        "huddle".to_owned(),
    ));

    vec![
        audio as Arc<dyn TrackLocal + Send + Sync>,
        video as Arc<dyn TrackLocal + Send + Sync>,
    ]
}
