// Voice mixer run by the audio callback
// New voices arrive through a ring buffer so the callback never blocks on the player
// Finished voices go back through a second ring buffer and are dropped on the control side

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::resource::SoundResource;

type VoiceProducer = ringbuf::HeapProd<Voice>;
type VoiceConsumer = ringbuf::HeapCons<Voice>;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// One playback of a resource
pub struct Voice {
    resource: Arc<SoundResource>,
    cursor: usize,
}

impl Voice {
    pub fn new(resource: Arc<SoundResource>) -> Self {
        Self {
            resource,
            cursor: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.resource.samples().len()
    }
}

/// Control side of the mixer: hands voices to the audio thread
pub struct VoiceSender {
    producer: VoiceProducer,
    retired: VoiceConsumer,
    in_flight: Arc<AtomicUsize>,
}

impl VoiceSender {
    /// Queue a voice for playback
    /// Returns false when the queue is full and the voice was dropped
    pub fn send(&mut self, voice: Voice) -> bool {
        self.collect_finished();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.producer.try_push(voice).is_ok() {
            true
        } else {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            false
        }
    }

    /// Voices queued or still sounding
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Drop voices the mixer has finished with, returning how many there were
    pub fn collect_finished(&mut self) -> usize {
        let mut collected = 0;
        while let Some(voice) = self.retired.try_pop() {
            drop(voice);
            collected += 1;
        }
        collected
    }

    /// Block until every voice has finished or `timeout` passes
    /// Returns true if nothing was left playing in time
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.collect_finished();
            if self.in_flight() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(IDLE_POLL_INTERVAL);
        }
    }
}

/// Audio side of the mixer: sums active voices into an output buffer
pub struct Mixer {
    pending: VoiceConsumer,
    retired: VoiceProducer,
    active: Vec<Voice>,
    max_voices: usize,
    in_flight: Arc<AtomicUsize>,
}

impl Mixer {
    /// Create a mixer playing at most `max_voices` at once
    /// and holding up to `queue_capacity` voices waiting to start
    pub fn new(max_voices: usize, queue_capacity: usize) -> (Self, VoiceSender) {
        let max_voices = max_voices.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (producer, pending) = HeapRb::<Voice>::new(queue_capacity).split();
        // Room for every voice that can exist at once, so retiring never fails
        let (retired_producer, retired) = HeapRb::<Voice>::new(queue_capacity + max_voices).split();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mixer = Self {
            pending,
            retired: retired_producer,
            active: Vec::with_capacity(max_voices),
            max_voices,
            in_flight: in_flight.clone(),
        };
        let sender = VoiceSender {
            producer,
            retired,
            in_flight,
        };
        (mixer, sender)
    }

    pub fn active_voices(&self) -> usize {
        self.active.len()
    }

    /// Fill `out` (interleaved, output format) with the sum of all active voices
    pub fn mix(&mut self, out: &mut [f32]) {
        while self.active.len() < self.max_voices {
            match self.pending.try_pop() {
                Some(voice) => self.active.push(voice),
                None => break,
            }
        }

        out.fill(0.0);

        for voice in &mut self.active {
            // Read on every callback so volume changes reach playing voices
            let volume = voice.resource.volume();
            let remaining = &voice.resource.samples()[voice.cursor..];
            let written = remaining.len().min(out.len());
            for (sample, &source) in out.iter_mut().zip(remaining) {
                *sample += source * volume;
            }
            voice.cursor += written;
        }

        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].is_finished() {
                let voice = self.active.swap_remove(index);
                self.retire(voice);
            } else {
                index += 1;
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    fn retire(&mut self, voice: Voice) {
        // Hand the resource back so its samples are never freed on the audio thread
        if let Err(voice) = self.retired.try_push(voice) {
            drop(voice);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
