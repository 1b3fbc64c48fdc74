use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Analysis resolution: 256 samples in, 128 magnitude bins out.
pub const FFT_SIZE: usize = 256;

pub const BASS_CUTOFF_HZ: f32 = 250.0;
pub const MIDS_CUTOFF_HZ: f32 = 2_000.0;
pub const TREBLE_CUTOFF_HZ: f32 = 14_000.0;

/// Latest band-energy reading, each value in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandEnergies {
    pub bass: f32,
    pub mids: f32,
    pub treble: f32,
    pub overall: f32,
}

impl BandEnergies {
    pub fn is_silent(&self) -> bool {
        self.bass == 0.0 && self.mids == 0.0 && self.treble == 0.0 && self.overall == 0.0
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Seqlock-style cell for the snapshot: the analysis thread is the only
/// writer, the render loop reads the latest value without blocking.
/// Odd sequence => write in progress.
pub struct AtomicBandEnergies {
    seq: AtomicU64,
    bass: AtomicU32,
    mids: AtomicU32,
    treble: AtomicU32,
    overall: AtomicU32,
}

impl AtomicBandEnergies {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            bass: AtomicU32::new(0),
            mids: AtomicU32::new(0),
            treble: AtomicU32::new(0),
            overall: AtomicU32::new(0),
        }
    }

    pub fn store(&self, b: BandEnergies) {
        self.seq.fetch_add(1, Ordering::Release);
        self.bass.store(sanitize(b.bass).to_bits(), Ordering::Relaxed);
        self.mids.store(sanitize(b.mids).to_bits(), Ordering::Relaxed);
        self.treble.store(sanitize(b.treble).to_bits(), Ordering::Relaxed);
        self.overall.store(sanitize(b.overall).to_bits(), Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release);
    }

    pub fn load(&self) -> BandEnergies {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                continue;
            }
            let out = BandEnergies {
                bass: f32::from_bits(self.bass.load(Ordering::Relaxed)),
                mids: f32::from_bits(self.mids.load(Ordering::Relaxed)),
                treble: f32::from_bits(self.treble.load(Ordering::Relaxed)),
                overall: f32::from_bits(self.overall.load(Ordering::Relaxed)),
            };
            let v2 = self.seq.load(Ordering::Acquire);
            if v1 == v2 {
                return out;
            }
        }
    }

    pub fn reset(&self) {
        self.store(BandEnergies::default());
    }
}

impl Default for AtomicBandEnergies {
    fn default() -> Self {
        Self::new()
    }
}

/// Partitions normalized magnitude bins into the four bands by bin frequency
/// and takes each band's mean. An empty band resolves to 0.0, never NaN.
pub fn band_energies(mags: &[f32], sample_rate_hz: u32) -> BandEnergies {
    let n = mags.len() * 2;
    if mags.is_empty() || n == 0 {
        return BandEnergies::default();
    }

    let sr = sample_rate_hz as f32;
    let mut sums = [0.0f32; 3];
    let mut counts = [0u32; 3];
    let mut overall_sum = 0.0f32;
    let mut overall_count = 0u32;

    // Bin 0 is DC; it belongs to no band.
    for (i, &m) in mags.iter().enumerate().skip(1) {
        let f = (i as f32) * sr / (n as f32);
        overall_sum += m;
        overall_count += 1;
        let band = if f < BASS_CUTOFF_HZ {
            0
        } else if f < MIDS_CUTOFF_HZ {
            1
        } else if f < TREBLE_CUTOFF_HZ {
            2
        } else {
            continue;
        };
        sums[band] += m;
        counts[band] += 1;
    }

    let mean = |sum: f32, count: u32| if count == 0 { 0.0 } else { sum / count as f32 };
    BandEnergies {
        bass: sanitize(mean(sums[0], counts[0])),
        mids: sanitize(mean(sums[1], counts[1])),
        treble: sanitize(mean(sums[2], counts[2])),
        overall: sanitize(mean(overall_sum, overall_count)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorStatus {
    Inactive,
    /// File-backed source running.
    Playing,
    /// Live microphone source running.
    Listening,
}

enum SourceBackend {
    Mic(#[allow(dead_code)] cpal::Stream),
    File,
}

struct ActiveSource {
    backend: SourceBackend,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    status: ExtractorStatus,
}

/// Owns the audio source and the analysis thread. Single-owner resource: at
/// most one source is ever active, and starting a new one stops the old one
/// first.
pub struct AudioExtractor {
    active: Option<ActiveSource>,
    snapshot: Arc<AtomicBandEnergies>,
}

impl AudioExtractor {
    pub fn new() -> Self {
        Self {
            active: None,
            snapshot: Arc::new(AtomicBandEnergies::new()),
        }
    }

    /// Latest band reading; lossy, never blocks.
    pub fn snapshot(&self) -> BandEnergies {
        self.snapshot.load()
    }

    /// Shared handle for the render loop's per-tick reads.
    pub fn shared(&self) -> Arc<AtomicBandEnergies> {
        Arc::clone(&self.snapshot)
    }

    pub fn status(&self) -> ExtractorStatus {
        match &self.active {
            None => ExtractorStatus::Inactive,
            Some(src) if src.finished.load(Ordering::Relaxed) => ExtractorStatus::Inactive,
            Some(src) => src.status,
        }
    }

    /// Starts sampling from a live input device. A failed open leaves the
    /// extractor inactive; it is not fatal to the caller.
    pub fn start_mic(&mut self, device_query: Option<&str>) -> anyhow::Result<()> {
        self.stop();

        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb = HeapRb::<f32>::new((sample_rate_hz as usize).saturating_mul(2));
        let (mut prod, mut cons) = rb.split();

        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let snapshot = Arc::clone(&self.snapshot);
        let stop_for_thread = Arc::clone(&stop);

        let err_fn = |err| debug!(%err, "audio stream error");
        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };
        stream.play().context("start input stream")?;

        let handle = thread::spawn(move || {
            let mut analyzer = WindowAnalyzer::new(sample_rate_hz);
            while !stop_for_thread.load(Ordering::Relaxed) {
                let mut got_any = false;
                while let Some(s) = cons.try_pop() {
                    got_any = true;
                    if let Some(bands) = analyzer.push(s) {
                        snapshot.store(bands);
                    }
                }
                if !got_any {
                    thread::sleep(Duration::from_millis(1));
                }
            }
            debug!("mic analysis thread stopped");
        });

        debug!(sample_rate_hz, "microphone source started");
        self.active = Some(ActiveSource {
            backend: SourceBackend::Mic(stream),
            stop,
            finished,
            handle: Some(handle),
            status: ExtractorStatus::Listening,
        });
        Ok(())
    }

    /// Starts analyzing a WAV file, paced in real time on its own thread.
    /// The extractor returns to inactive (with a zero snapshot) when the
    /// file runs out.
    pub fn start_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        self.stop();

        let path = path.as_ref();
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("open audio file {}", path.display()))?;
        let spec = reader.spec();
        let sample_rate_hz = spec.sample_rate;
        let samples = decode_mono(reader).context("decode audio file")?;

        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let snapshot = Arc::clone(&self.snapshot);
        let stop_for_thread = Arc::clone(&stop);
        let finished_for_thread = Arc::clone(&finished);

        let handle = thread::spawn(move || {
            let mut analyzer = WindowAnalyzer::new(sample_rate_hz);
            let hop = FFT_SIZE / 2;
            let hop_dur = Duration::from_secs_f64(hop as f64 / sample_rate_hz as f64);

            for chunk in samples.chunks(hop) {
                if stop_for_thread.load(Ordering::Relaxed) {
                    break;
                }
                for &s in chunk {
                    if let Some(bands) = analyzer.push(s) {
                        snapshot.store(bands);
                    }
                }
                thread::sleep(hop_dur);
            }

            snapshot.reset();
            finished_for_thread.store(true, Ordering::Relaxed);
            debug!("file analysis thread stopped");
        });

        debug!(sample_rate_hz, "file source started");
        self.active = Some(ActiveSource {
            backend: SourceBackend::File,
            stop,
            finished,
            handle: Some(handle),
            status: ExtractorStatus::Playing,
        });
        Ok(())
    }

    /// Releases the source and zeroes the snapshot. Synchronous and
    /// idempotent: stopping an already-stopped extractor is a no-op.
    pub fn stop(&mut self) {
        let Some(mut src) = self.active.take() else {
            return;
        };
        src.stop.store(true, Ordering::Relaxed);
        if let Some(h) = src.handle.take() {
            let _ = h.join();
        }
        match src.backend {
            SourceBackend::Mic(stream) => drop(stream),
            SourceBackend::File => {}
        }
        self.snapshot.reset();
        debug!("audio source stopped");
    }
}

impl Default for AudioExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioExtractor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sliding Hann-windowed FFT over a mono stream. Emits one band reading per
/// hop (half a window).
struct WindowAnalyzer {
    sample_rate_hz: u32,
    scratch: Vec<f32>,
    hann: Vec<f32>,
    fft: Arc<dyn rustfft::Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    mags: Vec<f32>,
    write_pos: usize,
    filled: usize,
    since_hop: usize,
}

impl WindowAnalyzer {
    fn new(sample_rate_hz: u32) -> Self {
        let n = FFT_SIZE;
        let hann = (0..n)
            .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / (n as f32)).cos())
            .collect();
        let mut planner = FftPlanner::<f32>::new();
        Self {
            sample_rate_hz,
            scratch: vec![0.0; n],
            hann,
            fft: planner.plan_fft_forward(n),
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            mags: vec![0.0; n / 2],
            write_pos: 0,
            filled: 0,
            since_hop: 0,
        }
    }

    fn push(&mut self, sample: f32) -> Option<BandEnergies> {
        let n = FFT_SIZE;
        self.scratch[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % n;
        if self.filled < n {
            self.filled += 1;
        }
        self.since_hop += 1;
        if self.filled < n || self.since_hop < n / 2 {
            return None;
        }
        self.since_hop = 0;

        for i in 0..n {
            let s = self.scratch[(self.write_pos + i) % n];
            self.fft_buf[i].re = s * self.hann[i];
            self.fft_buf[i].im = 0.0;
        }
        self.fft.process(&mut self.fft_buf);

        // Normalize so a full-scale sine lands well inside [0, 1].
        let norm = 2.0 / n as f32;
        for (i, c) in self.fft_buf.iter().take(n / 2).enumerate() {
            self.mags[i] = ((c.re * c.re + c.im * c.im).sqrt() * norm).clamp(0.0, 1.0);
        }
        Some(band_energies(&self.mags, self.sample_rate_hz))
    }
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    for frame in data.chunks(channels.max(1)) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = acc / channels.max(1) as f32;
        let _ = prod.try_push(mono);
    }
}

fn decode_mono(mut reader: hound::WavReader<impl io::Read>) -> anyhow::Result<Vec<f32>> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("read float samples")?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("read int samples")?
        }
    };

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        let sum: f32 = frame.iter().sum();
        mono.push(sum / channels as f32);
    }
    Ok(mono)
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    if let Some(want) = device_query.map(|s| s.to_lowercase()) {
        if let Some(dev) = devices.iter().find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(&want))
                .unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        return Err(anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}
