use std::{
	collections::HashSet,
	sync::Arc,
};

use async_trait::async_trait;
use raiden_light_primitives::types::{
	Address,
	MessageIdentifier,
};
use raiden_light_state_machine::{
	types::ChainState,
	views::{
		self,
		OutboundMessage,
	},
};
use tracing::{
	debug,
	trace,
};

use super::{
	Context,
	Process,
};
use crate::transitioner::Reduced;

/// Identity of a pending message. Acknowledgements only ever refer to one recipient.
type Pending = (Address, Option<MessageIdentifier>, &'static str);

fn pending_key(outbound: &OutboundMessage) -> Pending {
	(outbound.recipient, outbound.message.message_identifier(), outbound.message.type_name())
}

/// Sends every unacknowledged message as soon as it is signed, then again on every tick
/// until its acknowledgement is reduced or its record is gone.
pub struct RetryProcess {
	ctx: Context,
	/// Messages sent at least once and still pending.
	sent: HashSet<Pending>,
}

impl RetryProcess {
	pub fn new(ctx: Context) -> Self {
		Self { ctx, sent: HashSet::new() }
	}

	async fn send(&self, outbound: &OutboundMessage) -> bool {
		if !self.ctx.transport.is_available(&outbound.recipient) {
			trace!(
				message = "Peer unavailable, holding message",
				recipient = format!("{:#x}", outbound.recipient),
				kind = outbound.message.type_name(),
			);
			return false
		}
		match self.ctx.transport.send(outbound.recipient, &outbound.message).await {
			Ok(()) => true,
			Err(e) => {
				debug!(
					message = "Could not send message",
					kind = outbound.message.type_name(),
					meta = outbound.meta.to_string(),
					error = format!("{:?}", e),
				);
				false
			},
		}
	}

	/// Send what is pending in `state`, everything or only what was never sent.
	async fn flush(&mut self, state: &ChainState, resend: bool) {
		let pending = views::pending_outbound_messages(state);
		let keys: HashSet<Pending> = pending.iter().map(pending_key).collect();
		self.sent.retain(|key| keys.contains(key));

		for outbound in pending.iter() {
			let key = pending_key(outbound);
			if !resend && self.sent.contains(&key) {
				continue
			}
			if self.send(outbound).await {
				self.sent.insert(key);
			}
		}
	}
}

#[async_trait]
impl Process for RetryProcess {
	fn name(&self) -> &'static str {
		"retry"
	}

	async fn reconcile(&mut self, state: Arc<ChainState>) {
		self.flush(&state, true).await;
	}

	async fn on_reduced(&mut self, reduced: Reduced) {
		if !reduced.changed {
			return
		}
		let state = self.ctx.dispatcher.state();
		self.flush(&state, false).await;
	}

	async fn on_tick(&mut self) {
		let state = self.ctx.dispatcher.state();
		self.flush(&state, true).await;
	}
}
