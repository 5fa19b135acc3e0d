//! Topologically-ordered render graph: one node per processor, wired by
//! [`Edge`]s, rendered in two passes per node (voice-level, then the mixed
//! sum) per §4.3's "Device connections and rendering" description.
//!
//! Buffers are preallocated at construction time for every `(node, port,
//! voice slot)` combination the graph can ever touch, so a chunk of render
//! work never allocates, matching the contract [`crate::error::Error`]
//! documents for the render path.

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::error::{Error, Result};
use crate::graph::port::{input_ports, output_port, Edge, PortKind, MASTER};
use crate::processor::{
    bitcrush, chorus, debug_pulse, envgen, filter, force, freeverb, looper, oscillator, pitch, sample_player,
    MixedProcState, ProcessorKind, VoiceProcState,
};
use crate::voice::pool::VoicePool;
use crate::voice::voice::Priority;
use crate::work_buffer::WorkBuffer;

pub struct DeviceGraph {
    processors: Vec<ProcessorKind>,
    edges: Vec<Edge>,
    order: Vec<usize>,
    mixed_states: Vec<MixedProcState>,
    mixed_out: Vec<WorkBuffer>,
    /// `mixed_in[node][port_index]`, where `port_index` indexes
    /// `input_ports(&processors[node])`.
    mixed_in: Vec<Vec<WorkBuffer>>,
    /// `voice_out[node][slot]`, one buffer per processor per pool slot.
    voice_out: Vec<Vec<WorkBuffer>>,
    /// `voice_in[node][port_index][slot]`.
    voice_in: Vec<Vec<Vec<WorkBuffer>>>,
    master_l: WorkBuffer,
    master_r: WorkBuffer,
    /// Silent fallback for an unwired input port, so a missing connection
    /// reads as 0 cents / 0 dB / silence rather than panicking.
    zero: Vec<f32>,
}

impl DeviceGraph {
    pub fn new(
        processors: Vec<ProcessorKind>,
        edges: Vec<Edge>,
        pool_capacity: usize,
        buffer_size: usize,
        audio_rate: i32,
    ) -> Result<Self> {
        let mut dag = DiGraph::<(), ()>::with_capacity(processors.len(), edges.len());
        for _ in &processors {
            dag.add_node(());
        }
        for e in &edges {
            if e.dst == MASTER {
                continue;
            }
            dag.add_edge((e.src as u32).into(), (e.dst as u32).into(), ());
        }
        let order = toposort(&dag, None)
            .map_err(|_| Error::Format("device graph: connection cycle between processors".into()))?
            .into_iter()
            .map(|n| n.index())
            .collect();

        let mixed_states = processors.iter().map(|k| MixedProcState::new_for(k, audio_rate)).collect();
        let mixed_out = processors.iter().map(|_| WorkBuffer::new(buffer_size)).collect();
        let mixed_in = processors.iter().map(|k| input_ports(k).iter().map(|_| WorkBuffer::new(buffer_size)).collect()).collect();
        let voice_out = processors.iter().map(|_| (0..pool_capacity).map(|_| WorkBuffer::new(buffer_size)).collect()).collect();
        let voice_in = processors
            .iter()
            .map(|k| {
                input_ports(k)
                    .iter()
                    .map(|_| (0..pool_capacity).map(|_| WorkBuffer::new(buffer_size)).collect())
                    .collect()
            })
            .collect();

        Ok(DeviceGraph {
            processors,
            edges,
            order,
            mixed_states,
            mixed_out,
            mixed_in,
            voice_out,
            voice_in,
            master_l: WorkBuffer::new(buffer_size),
            master_r: WorkBuffer::new(buffer_size),
            zero: vec![0.0; buffer_size],
        })
    }

    pub fn master_output(&self) -> (&WorkBuffer, &WorkBuffer) {
        (&self.master_l, &self.master_r)
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    pub fn processors(&self) -> &[ProcessorKind] {
        &self.processors
    }

    /// Render one chunk of `frames` audio, advancing every active voice's
    /// per-note processors and every device's mixed-level state.
    pub fn render_chunk(&mut self, pool: &mut VoicePool, frames: usize, tempo: f64, audio_rate: i32) {
        let order = std::mem::take(&mut self.order);
        for &node in &order {
            if self.processors[node].produces_voice_signal() {
                self.render_voice_node(node, pool, frames, tempo, audio_rate);
            } else {
                self.gather_mixed_inputs(node, frames);
                self.render_mixed_node(node, frames, audio_rate);
            }
        }
        self.order = order;

        self.mix_master(frames);
    }

    fn render_voice_node(&mut self, node: usize, pool: &mut VoicePool, frames: usize, tempo: f64, audio_rate: i32) {
        self.mixed_out[node].clear(0, frames);
        let is_audio_out = output_port(&self.processors[node]) == PortKind::Audio;

        for slot in 0..pool.len() {
            let (active, note_on) = {
                let v = pool.voice(slot);
                (v.is_active() && v.processor_index == node, v.note_on)
            };
            if !active {
                continue;
            }

            self.gather_voice_inputs(node, slot, frames);
            let deactivate_at = self.render_one_voice(node, slot, pool, note_on, frames, tempo, audio_rate);

            if is_audio_out {
                self.accumulate_voice_audio(node, slot, frames);
            } else {
                let DeviceGraph { voice_out, mixed_out, .. } = self;
                mixed_out[node].mix(&voice_out[node][slot], 0, frames);
            }

            if deactivate_at.is_some() {
                pool.voice_mut(slot).priority = Priority::Inactive;
            }
        }
    }

    fn gather_voice_inputs(&mut self, node: usize, slot: usize, frames: usize) {
        let DeviceGraph { processors, edges, voice_out, voice_in, .. } = self;
        let ports = input_ports(&processors[node]);
        for (pi, &port) in ports.iter().enumerate() {
            let dest = &mut voice_in[node][pi][slot];
            dest.clear(0, frames);
            for e in edges.iter().filter(|e| e.dst == node && e.dst_port == port) {
                dest.mix(&voice_out[e.src][slot], 0, frames);
            }
        }
    }

    fn gather_mixed_inputs(&mut self, node: usize, frames: usize) {
        let DeviceGraph { processors, edges, mixed_out, mixed_in, .. } = self;
        let ports = input_ports(&processors[node]);
        for (pi, &port) in ports.iter().enumerate() {
            let dest = &mut mixed_in[node][pi];
            dest.clear(0, frames);
            for e in edges.iter().filter(|e| e.dst == node && e.dst_port == port) {
                dest.mix(&mixed_out[e.src], 0, frames);
            }
        }
    }

    /// Multiplies an audio-producing voice's output by the linear gain of
    /// its wired Force port (`10^(db/20)`), then sums it into the node's
    /// mixed output. A Force-less voice contributes unscaled.
    fn accumulate_voice_audio(&mut self, node: usize, slot: usize, frames: usize) {
        let force_idx = input_ports(&self.processors[node]).iter().position(|&p| p == PortKind::Force);
        let DeviceGraph { voice_out, voice_in, mixed_out, .. } = self;

        if let Some(pi) = force_idx {
            let force_db = voice_in[node][pi][slot].as_slice();
            let out = voice_out[node][slot].as_mut_slice();
            for i in 0..frames {
                out[i] *= 10f32.powf(force_db[i] / 20.0);
            }
        }
        mixed_out[node].mix(&voice_out[node][slot], 0, frames);
    }

    fn pitch_input<'a>(&'a self, node: usize, slot: usize, frames: usize) -> &'a [f32] {
        match input_ports(&self.processors[node]).iter().position(|&p| p == PortKind::Pitch) {
            Some(pi) => &self.voice_in[node][pi][slot].as_slice()[..frames],
            None => &self.zero[..frames],
        }
    }

    fn force_input<'a>(&'a self, node: usize, slot: usize, frames: usize) -> &'a [f32] {
        match input_ports(&self.processors[node]).iter().position(|&p| p == PortKind::Force) {
            Some(pi) => &self.voice_in[node][pi][slot].as_slice()[..frames],
            None => &self.zero[..frames],
        }
    }

    fn render_one_voice(
        &mut self,
        node: usize,
        slot: usize,
        pool: &mut VoicePool,
        note_on: bool,
        frames: usize,
        tempo: f64,
        audio_rate: i32,
    ) -> Option<usize> {
        let pitch_in = self.pitch_input(node, slot, frames);
        let force_in = self.force_input(node, slot, frames);

        let DeviceGraph { processors, voice_out, .. } = self;
        let kind = &processors[node];
        let voice = pool.voice_mut(slot);
        let out = &mut voice_out[node][slot];

        match (kind, &mut voice.state) {
            (ProcessorKind::Pitch(cfg), VoiceProcState::Pitch(vs)) => {
                pitch::render_voice(vs, cfg, out, frames, tempo, audio_rate);
                None
            }
            (ProcessorKind::Force(cfg), VoiceProcState::Force(vs)) => {
                let (_, deactivate) = force::render_voice(vs, cfg, out, Some(pitch_in), frames, tempo, audio_rate);
                deactivate
            }
            (ProcessorKind::Oscillator(cfg), VoiceProcState::Oscillator(vs)) => {
                oscillator::render_voice(vs, cfg, pitch_in, out, frames, audio_rate);
                None
            }
            (ProcessorKind::SamplePlayer(cfg), VoiceProcState::SamplePlayer(vs)) => {
                let (_, deactivate) = sample_player::render_voice(vs, cfg, pitch_in, 0, out, frames, audio_rate);
                deactivate
            }
            (ProcessorKind::EnvGen(cfg), VoiceProcState::EnvGen(vs)) => {
                envgen::render_voice(vs, cfg, Some(force_in), note_on, out, frames, audio_rate);
                None
            }
            (ProcessorKind::DebugPulse(cfg), VoiceProcState::DebugPulse(vs)) => {
                let (_, deactivate) = debug_pulse::render_voice(vs, cfg, pitch_in, note_on, out, frames, audio_rate);
                deactivate
            }
            _ => None,
        }
    }

    fn render_mixed_node(&mut self, node: usize, frames: usize, audio_rate: i32) {
        let DeviceGraph { processors, mixed_states, mixed_in, mixed_out, .. } = self;
        let kind = &processors[node];
        let state = &mut mixed_states[node];
        let input = &mixed_in[node][0].as_slice()[..frames];
        let output = &mut mixed_out[node].as_mut_slice()[..frames];

        match (kind, state) {
            (ProcessorKind::Bitcrush(cfg), MixedProcState::Bitcrush(st)) => {
                bitcrush::process(st, cfg, input, output, audio_rate);
            }
            (ProcessorKind::Filter(cfg), MixedProcState::Filter(st)) => {
                filter::process(st, cfg, input, output, audio_rate);
            }
            (ProcessorKind::Freeverb(cfg), MixedProcState::Freeverb(st)) => {
                // The graph models a mono signal per node; feed it as both
                // channels and fold Freeverb's stereo output back to mono.
                let mut out_l = vec![0.0; frames];
                let mut out_r = vec![0.0; frames];
                freeverb::process(st, cfg, input, input, &mut out_l, &mut out_r, audio_rate);
                for i in 0..frames {
                    output[i] = (out_l[i] + out_r[i]) * 0.5;
                }
            }
            (ProcessorKind::Chorus(cfg), MixedProcState::Chorus(st)) => {
                chorus::process(st, cfg, input, output, audio_rate);
            }
            (ProcessorKind::Looper(cfg), MixedProcState::Looper(st)) => {
                looper::process(st, cfg, input, output, 1.0);
            }
            _ => {}
        }
        mixed_out[node].set_const_start(frames);
        mixed_out[node].set_final(false);
    }

    fn mix_master(&mut self, frames: usize) {
        self.master_l.clear(0, frames);
        self.master_r.clear(0, frames);
        let DeviceGraph { edges, mixed_out, master_l, master_r, .. } = self;
        for e in edges.iter() {
            if e.dst != MASTER {
                continue;
            }
            match e.dst_port {
                PortKind::MasterLeft => master_l.mix(&mixed_out[e.src], 0, frames),
                PortKind::MasterRight => master_r.mix(&mixed_out[e.src], 0, frames),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::oscillator::{OscillatorConfig, OscillatorVoiceState, Waveform};
    use crate::processor::pitch::{PitchConfig, PitchVoiceState};
    use crate::voice::voice::Voice;

    fn pitch_to_osc_graph(pool_capacity: usize, buffer_size: usize, audio_rate: i32) -> DeviceGraph {
        let processors = vec![
            ProcessorKind::Pitch(PitchConfig::default()),
            ProcessorKind::Oscillator(OscillatorConfig { waveform: Waveform::Sine, noise_integration_order: 0 }),
        ];
        let edges = vec![
            Edge { src: 0, src_port: PortKind::Pitch, dst: 1, dst_port: PortKind::Pitch },
            Edge { src: 1, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterLeft },
            Edge { src: 1, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterRight },
        ];
        DeviceGraph::new(processors, edges, pool_capacity, buffer_size, audio_rate).unwrap()
    }

    #[test]
    fn cyclic_wiring_is_rejected() {
        let processors = vec![ProcessorKind::Filter(crate::processor::filter::FilterConfig {
            mode: crate::processor::filter::FilterMode::Lowpass,
            cutoff_hz: 1000.0,
            resonance: 50.0,
        })];
        let edges = vec![Edge { src: 0, src_port: PortKind::Audio, dst: 0, dst_port: PortKind::Audio }];
        assert!(DeviceGraph::new(processors, edges, 1, 64, 48000).is_err());
    }

    #[test]
    fn one_active_voice_produces_nonzero_master_output() {
        let mut graph = pitch_to_osc_graph(4, 64, 48000);
        let mut pool = VoicePool::new(4);
        let g = pool.reserve(0, 2).unwrap();
        // Assign one voice to the pitch processor, one to the oscillator.
        let indices: Vec<usize> = pool.get_group(g).unwrap().voice_indices;
        *pool.voice_mut(indices[0]) = Voice {
            priority: crate::voice::voice::Priority::Foreground,
            channel: 0,
            group_id: g,
            processor_index: 0,
            note_on: true,
            frame_offset: 0,
            rand_seed: 1,
            state: VoiceProcState::Pitch(PitchVoiceState::new(0.0)),
        };
        *pool.voice_mut(indices[1]) = Voice {
            priority: crate::voice::voice::Priority::Foreground,
            channel: 0,
            group_id: g,
            processor_index: 1,
            note_on: true,
            frame_offset: 0,
            rand_seed: 2,
            state: VoiceProcState::Oscillator(OscillatorVoiceState::new(2, 0)),
        };

        graph.render_chunk(&mut pool, 64, 120.0, 48000);
        let (l, _r) = graph.master_output();
        let energy: f32 = l.as_slice().iter().map(|x| x.abs()).sum();
        assert!(energy > 0.0);
    }
}
