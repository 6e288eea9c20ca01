use std::time::Duration;

use tokio::{
	sync::mpsc,
	time::{
		self,
		MissedTickBehavior,
	},
};
use tokio_stream::{
	wrappers::IntervalStream,
	StreamExt,
};

/// Source of the retry cadence.
pub enum Ticker {
	Interval(IntervalStream),
	Manual(mpsc::UnboundedReceiver<()>),
}

impl Ticker {
	/// Ticks every `period`, the first tick right away.
	pub fn interval(period: Duration) -> Self {
		let mut interval = time::interval(period);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		Ticker::Interval(IntervalStream::new(interval))
	}

	/// Ticks whenever the returned handle says so.
	pub fn manual() -> (Self, ManualTick) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(Ticker::Manual(receiver), ManualTick(sender))
	}

	/// Wait for the next tick. `false` once no tick will ever come.
	pub async fn tick(&mut self) -> bool {
		match self {
			Ticker::Interval(stream) => stream.next().await.is_some(),
			Ticker::Manual(receiver) => receiver.recv().await.is_some(),
		}
	}
}

#[derive(Clone)]
pub struct ManualTick(mpsc::UnboundedSender<()>);

impl ManualTick {
	pub fn tick(&self) -> bool {
		self.0.send(()).is_ok()
	}
}
