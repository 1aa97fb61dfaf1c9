// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use super::frame::{LoopbackFrame, RgbImage};
use super::ledger::ReleaseLedger;
use super::packet::{LoopbackPacket, Payload};
use crate::core::engine::{
    GraphEngine, GraphService, PacketCallback, Rejected, Releasable, TextureFrame,
};
use crate::core::frames::BYTES_PER_MONO_SAMPLE;
use crate::core::{FrameFeedError, Result};

/// Engine call recorded by [`LoopbackGraph`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCall {
    Start,
    CloseAllInputs,
    WaitUntilDrained,
    WaitUntilIdle,
    TearDown,
    RegisterOutputCallback(String),
    SetStreamHeader(String),
    SetInputSidePackets(Vec<String>),
    SetParentGlContext(u64),
    SetServiceObject(String),
}

#[derive(Default)]
struct GraphInner {
    started: bool,
    inputs_closed: bool,
    torn_down: bool,
    routes: HashMap<String, String>,
    pending: VecDeque<(String, LoopbackPacket)>,
    last_timestamps: HashMap<String, i64>,
    submissions: HashMap<String, Vec<i64>>,
    headers: HashMap<String, LoopbackPacket>,
    side_packets: HashMap<String, LoopbackPacket>,
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
    calls: Vec<GraphCall>,
}

#[derive(Default)]
struct Faults {
    reject_submissions: AtomicUsize,
    fail_packet_creations: AtomicUsize,
    fail_start: AtomicBool,
    fail_drain: AtomicBool,
    fail_idle: AtomicBool,
    fail_teardown: AtomicBool,
}

impl Faults {
    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// In-process [`GraphEngine`] that forwards input streams to output streams
/// unchanged.
///
/// Admitted packets queue up until [`process_pending`](Self::process_pending)
/// (or a drain/idle wait) runs them through the configured routes. Every
/// buffer it creates is counted in a [`ReleaseLedger`], and failures can be
/// injected at each engine call.
pub struct LoopbackGraph {
    ledger: Arc<ReleaseLedger>,
    inner: Mutex<GraphInner>,
    callbacks: RwLock<HashMap<String, Vec<Arc<PacketCallback<LoopbackPacket>>>>>,
    /// Serializes delivery so outputs keep submission order.
    delivery: Mutex<()>,
    start_count: AtomicUsize,
    faults: Faults,
}

impl LoopbackGraph {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(ReleaseLedger::new()),
            inner: Mutex::new(GraphInner::default()),
            callbacks: RwLock::new(HashMap::new()),
            delivery: Mutex::new(()),
            start_count: AtomicUsize::new(0),
            faults: Faults::default(),
        }
    }

    /// Forwards every packet admitted on `input` to the callbacks of `output`.
    pub fn with_route(self, input: &str, output: &str) -> Self {
        self.inner
            .lock()
            .routes
            .insert(input.to_string(), output.to_string());
        self
    }

    pub fn ledger(&self) -> Arc<ReleaseLedger> {
        Arc::clone(&self.ledger)
    }

    pub fn start_count(&self) -> usize {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<GraphCall> {
        self.inner.lock().calls.clone()
    }

    /// Timestamps admitted on `stream`, in order.
    pub fn submissions(&self, stream: &str) -> Vec<i64> {
        self.inner
            .lock()
            .submissions
            .get(stream)
            .cloned()
            .unwrap_or_default()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn has_header(&self, stream: &str) -> bool {
        self.inner.lock().headers.contains_key(stream)
    }

    pub fn side_packet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().side_packets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Object bound to `service`, if one of type `T` was set.
    pub fn service_object<T>(&self, service: &GraphService<T>) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let object = self.inner.lock().services.get(service.name()).cloned()?;
        object.downcast::<T>().ok()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.lock().torn_down
    }

    // Fault injection

    pub fn reject_next_submissions(&self, count: usize) {
        self.faults
            .reject_submissions
            .store(count, Ordering::SeqCst);
    }

    pub fn fail_next_packet_creations(&self, count: usize) {
        self.faults
            .fail_packet_creations
            .store(count, Ordering::SeqCst);
    }

    pub fn fail_start(&self) {
        self.faults.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn fail_drain(&self) {
        self.faults.fail_drain.store(true, Ordering::SeqCst);
    }

    pub fn fail_idle(&self) {
        self.faults.fail_idle.store(true, Ordering::SeqCst);
    }

    pub fn fail_teardown(&self) {
        self.faults.fail_teardown.store(true, Ordering::SeqCst);
    }

    /// Delivers `packet` to the callbacks of output `stream` directly, then
    /// releases it.
    pub fn emit(&self, stream: &str, packet: LoopbackPacket) {
        let _delivery = self.delivery.lock();
        self.deliver(stream, &packet);
        packet.release();
    }

    /// Runs every queued packet through its route and returns how many ran.
    ///
    /// Callbacks run without the graph's state lock held, so they may call
    /// back into the graph.
    pub fn process_pending(&self) -> usize {
        let _delivery = self.delivery.lock();
        let mut processed = 0;
        loop {
            let next = {
                let mut inner = self.inner.lock();
                inner
                    .pending
                    .pop_front()
                    .map(|(input, packet)| (inner.routes.get(&input).cloned(), packet))
            };
            let Some((output, packet)) = next else {
                break;
            };
            if let Some(output) = output {
                self.deliver(&output, &packet);
            }
            packet.release();
            processed += 1;
        }
        processed
    }

    fn deliver(&self, stream: &str, packet: &LoopbackPacket) {
        let callbacks = self.callbacks.read().get(stream).cloned();
        for callback in callbacks.into_iter().flatten() {
            callback(packet);
        }
    }

    fn record(&self, call: GraphCall) {
        self.inner.lock().calls.push(call);
    }

    fn injected(what: &str) -> FrameFeedError {
        FrameFeedError::Graph(format!("injected {} failure", what))
    }
}

impl Default for LoopbackGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEngine for LoopbackGraph {
    type Packet = LoopbackPacket;
    type Frame = LoopbackFrame;
    type Bitmap = RgbImage;

    fn start_graph(&self) -> Result<()> {
        self.record(GraphCall::Start);
        self.start_count.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_start.load(Ordering::SeqCst) {
            return Err(Self::injected("start"));
        }
        self.inner.lock().started = true;
        Ok(())
    }

    fn close_all_inputs(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(GraphCall::CloseAllInputs);
        inner.inputs_closed = true;
        Ok(())
    }

    fn wait_until_drained(&self) -> Result<()> {
        self.record(GraphCall::WaitUntilDrained);
        self.process_pending();
        if self.faults.fail_drain.load(Ordering::SeqCst) {
            return Err(Self::injected("drain"));
        }
        Ok(())
    }

    fn wait_until_idle(&self) -> Result<()> {
        self.record(GraphCall::WaitUntilIdle);
        self.process_pending();
        if self.faults.fail_idle.load(Ordering::SeqCst) {
            return Err(Self::injected("idle wait"));
        }
        Ok(())
    }

    fn tear_down(&self) -> Result<()> {
        let (headers, side_packets, pending) = {
            let mut inner = self.inner.lock();
            inner.calls.push(GraphCall::TearDown);
            inner.torn_down = true;
            inner.started = false;
            inner.services.clear();
            (
                std::mem::take(&mut inner.headers),
                std::mem::take(&mut inner.side_packets),
                std::mem::take(&mut inner.pending),
            )
        };
        self.callbacks.write().clear();
        for packet in headers.into_values().chain(side_packets.into_values()) {
            packet.release();
        }
        for (_, packet) in pending {
            packet.release();
        }

        if self.faults.fail_teardown.load(Ordering::SeqCst) {
            return Err(Self::injected("teardown"));
        }
        Ok(())
    }

    fn submit(
        &self,
        stream: &str,
        mut packet: LoopbackPacket,
        timestamp: i64,
    ) -> std::result::Result<(), Rejected<LoopbackPacket>> {
        if Faults::take(&self.faults.reject_submissions) {
            return Err(Rejected::new(packet, Self::injected("submission")));
        }

        let mut inner = self.inner.lock();
        if !inner.started {
            return Err(Rejected::new(
                packet,
                FrameFeedError::Graph("graph is not running".into()),
            ));
        }
        if inner.inputs_closed {
            return Err(Rejected::new(
                packet,
                FrameFeedError::Graph(format!("input stream '{}' is closed", stream)),
            ));
        }
        match inner.last_timestamps.get(stream) {
            Some(&last) if timestamp <= last => {
                return Err(Rejected::new(
                    packet,
                    FrameFeedError::Graph(format!(
                        "timestamp {} on '{}' is not greater than previous {}",
                        timestamp, stream, last
                    )),
                ));
            }
            _ => {}
        }

        packet.set_timestamp(timestamp);
        inner.last_timestamps.insert(stream.to_string(), timestamp);
        inner
            .submissions
            .entry(stream.to_string())
            .or_default()
            .push(timestamp);
        inner.pending.push_back((stream.to_string(), packet));
        Ok(())
    }

    fn register_output_callback(
        &self,
        stream: &str,
        callback: PacketCallback<LoopbackPacket>,
    ) -> Result<()> {
        if self.inner.lock().torn_down {
            return Err(FrameFeedError::Graph("graph is torn down".into()));
        }
        self.record(GraphCall::RegisterOutputCallback(stream.to_string()));
        self.callbacks
            .write()
            .entry(stream.to_string())
            .or_default()
            .push(Arc::new(callback));
        Ok(())
    }

    fn set_stream_header(&self, stream: &str, header: LoopbackPacket) -> Result<()> {
        let replaced = {
            let mut inner = self.inner.lock();
            inner
                .calls
                .push(GraphCall::SetStreamHeader(stream.to_string()));
            inner.headers.insert(stream.to_string(), header)
        };
        if let Some(previous) = replaced {
            previous.release();
        }
        Ok(())
    }

    fn set_input_side_packets(&self, packets: HashMap<String, LoopbackPacket>) -> Result<()> {
        let mut names: Vec<String> = packets.keys().cloned().collect();
        names.sort();

        let replaced: Vec<LoopbackPacket> = {
            let mut inner = self.inner.lock();
            inner.calls.push(GraphCall::SetInputSidePackets(names));
            packets
                .into_iter()
                .filter_map(|(name, packet)| inner.side_packets.insert(name, packet))
                .collect()
        };
        for packet in replaced {
            packet.release();
        }
        Ok(())
    }

    fn set_parent_gl_context(&self, context: u64) -> Result<()> {
        self.record(GraphCall::SetParentGlContext(context));
        Ok(())
    }

    fn set_service_object<T>(&self, service: &GraphService<T>, object: Arc<T>) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.started {
            return Err(FrameFeedError::Graph(format!(
                "service '{}' must be set before the graph starts",
                service.name()
            )));
        }
        inner
            .calls
            .push(GraphCall::SetServiceObject(service.name().to_string()));
        inner.services.insert(service.name().to_string(), object);
        Ok(())
    }

    fn packet_from_frame(
        &self,
        frame: LoopbackFrame,
    ) -> std::result::Result<LoopbackPacket, Rejected<LoopbackFrame>> {
        if Faults::take(&self.faults.fail_packet_creations) {
            return Err(Rejected::new(
                frame,
                FrameFeedError::PacketCreation("injected gpu buffer failure".into()),
            ));
        }
        let timestamp = frame.timestamp();
        Ok(LoopbackPacket::new(
            &self.ledger,
            Payload::Texture(frame),
            timestamp,
        ))
    }

    fn packet_from_bitmap(&self, bitmap: &RgbImage) -> Result<LoopbackPacket> {
        if Faults::take(&self.faults.fail_packet_creations) {
            return Err(FrameFeedError::PacketCreation(
                "injected image frame failure".into(),
            ));
        }
        if !bitmap.is_well_formed() {
            return Err(FrameFeedError::PacketCreation(format!(
                "{}x{} image carries {} bytes",
                bitmap.width,
                bitmap.height,
                bitmap.pixels.len()
            )));
        }
        Ok(LoopbackPacket::new(
            &self.ledger,
            Payload::Image(bitmap.clone()),
            0,
        ))
    }

    fn packet_from_audio(
        &self,
        data: &[u8],
        channel_count: u16,
        num_samples: usize,
    ) -> Result<LoopbackPacket> {
        if Faults::take(&self.faults.fail_packet_creations) {
            return Err(FrameFeedError::PacketCreation(
                "injected audio matrix failure".into(),
            ));
        }
        let needed = num_samples * channel_count as usize * BYTES_PER_MONO_SAMPLE;
        let Some(window) = data.get(..needed) else {
            return Err(FrameFeedError::PacketCreation(format!(
                "{} samples x {} channels need {} bytes, got {}",
                num_samples,
                channel_count,
                needed,
                data.len()
            )));
        };
        Ok(LoopbackPacket::audio(
            &self.ledger,
            Bytes::copy_from_slice(window),
            channel_count,
            num_samples,
            0,
        ))
    }

    fn time_series_header(&self, channel_count: u16, sample_rate: f64) -> Result<LoopbackPacket> {
        Ok(LoopbackPacket::new(
            &self.ledger,
            Payload::Header {
                channel_count,
                sample_rate,
            },
            0,
        ))
    }
}
