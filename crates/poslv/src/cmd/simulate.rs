use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use bytes::BytesMut;
use poslv_frame::{encode_frame, FrameHeader};
use poslv_gsof::{InsRmsSample, InsSample, InsStatus, RecordType};
use tracing::{debug, info, warn};

use crate::cmd::SimulateArgs;
use crate::exit::{io_error, CliError, CliResult, INTERNAL, SUCCESS};

const ACCEPT_POLL: Duration = Duration::from_millis(50);
const MS_PER_WEEK: u32 = 7 * 24 * 3600 * 1000;

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    let listener = TcpListener::bind(&args.bind)
        .map_err(|err| io_error(&format!("bind {} failed", args.bind), err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| io_error("listener setup failed", err))?;
    let local = listener
        .local_addr()
        .map_err(|err| io_error("listener setup failed", err))?;
    info!(%local, rate = args.rate, "serving synthetic GSOF frames");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let interval = Duration::from_secs(1) / args.rate;
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let running = running.clone();
                let count = args.count;
                thread::spawn(move || serve(stream, peer, interval, count, &running));
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(io_error("accept failed", err)),
        }
    }

    info!("simulator stopped");
    Ok(SUCCESS)
}

fn serve(
    mut stream: TcpStream,
    peer: SocketAddr,
    interval: Duration,
    count: Option<u64>,
    running: &AtomicBool,
) {
    if let Err(err) = stream.set_nonblocking(false) {
        warn!(%peer, error = %err, "client setup failed");
        return;
    }
    info!(%peer, "client connected");

    let mut source = Trajectory::starting_now();
    let mut sent = 0u64;
    let mut buf = BytesMut::new();
    while running.load(Ordering::SeqCst) && count.is_none_or(|count| sent < count) {
        buf.clear();
        if let Err(err) = source.next_frame(&mut buf) {
            warn!(error = %err, "frame encoding failed");
            return;
        }
        if let Err(err) = stream.write_all(&buf) {
            info!(%peer, error = %err, "client disconnected");
            return;
        }
        sent += 1;
        thread::sleep(interval);
    }
    debug!(%peer, sent, "closing client");
}

/// A vehicle driving a slow circle, advanced one epoch per frame.
struct Trajectory {
    transmission: u8,
    gps_week: u16,
    gps_time_ms: u32,
    epoch: u32,
    step_ms: u32,
}

impl Trajectory {
    fn starting_now() -> Self {
        // GPS epoch is 1980-01-06, 315 964 800 s after the Unix epoch.
        let since_gps = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis().saturating_sub(315_964_800_000))
            .unwrap_or(0);
        let week_ms = u128::from(MS_PER_WEEK);
        Self {
            transmission: 0,
            gps_week: u16::try_from(since_gps / week_ms).unwrap_or(u16::MAX),
            gps_time_ms: u32::try_from(since_gps % week_ms).unwrap_or(0),
            epoch: 0,
            step_ms: 100,
        }
    }

    fn status(&self) -> InsStatus {
        InsStatus {
            gps_week: self.gps_week,
            gps_time_ms: self.gps_time_ms,
            imu_alignment_status: 4,
            gnss_status: 5,
        }
    }

    fn ins(&self) -> InsSample {
        let angle = f64::from(self.epoch) * 0.01;
        InsSample {
            status: self.status(),
            latitude: 37.5 + 0.001 * angle.sin(),
            longitude: -122.3 + 0.001 * angle.cos(),
            altitude: 30.0,
            north_velocity: (10.0 * angle.cos()) as f32,
            east_velocity: (-10.0 * angle.sin()) as f32,
            down_velocity: 0.0,
            total_speed: 10.0,
            roll: 0.5,
            pitch: -0.25,
            heading: (angle.to_degrees() + 90.0).rem_euclid(360.0),
            track_angle: (angle.to_degrees() + 90.0).rem_euclid(360.0),
            angular_rate_x: 0.0,
            angular_rate_y: 0.0,
            angular_rate_z: 0.57,
            acceleration_x: 0.0,
            acceleration_y: 1.0,
            acceleration_z: -9.81,
            captured_at: SystemTime::now(),
        }
    }

    fn rms(&self) -> InsRmsSample {
        InsRmsSample {
            status: self.status(),
            north_position_rms: 0.02,
            east_position_rms: 0.02,
            down_position_rms: 0.04,
            north_velocity_rms: 0.01,
            east_velocity_rms: 0.01,
            down_velocity_rms: 0.02,
            roll_rms: 0.01,
            pitch_rms: 0.01,
            heading_rms: 0.05,
            captured_at: SystemTime::now(),
        }
    }

    /// Encode one frame (INS, a type 51 placeholder and INS-RMS) and advance.
    fn next_frame(&mut self, dst: &mut BytesMut) -> Result<(), poslv_frame::FramingError> {
        let mut payload = BytesMut::new();
        self.ins().encode_record(&mut payload);
        payload.extend_from_slice(&[RecordType::TYPE_51, 4, 0, 0, 0, 0]);
        self.rms().encode_record(&mut payload);

        encode_frame(
            &FrameHeader {
                transmission_number: self.transmission,
                ..FrameHeader::default()
            },
            &payload,
            dst,
        )?;

        self.transmission = self.transmission.wrapping_add(1);
        self.epoch = self.epoch.wrapping_add(1);
        self.gps_time_ms += self.step_ms;
        if self.gps_time_ms >= MS_PER_WEEK {
            self.gps_time_ms -= MS_PER_WEEK;
            self.gps_week = self.gps_week.wrapping_add(1);
        }
        Ok(())
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
