use crate::ad::Ad;
use crate::kernel::{QvState, QV_KERNEL};
use civitas_types::{Group, KernelName, Ns, Timestamp};

pub(crate) fn ad(choices: &[&str]) -> Ad {
    ad_with(choices, QV_KERNEL, QvState::new(1.0))
}

pub(crate) fn ad_with(choices: &[&str], kernel: &str, state: QvState) -> Ad {
    Ad {
        id: Ns::parse("test/ballot").unwrap(),
        title: "t".into(),
        description: String::new(),
        choices: choices.iter().map(|c| c.to_string()).collect(),
        kernel: KernelName::new(kernel),
        participants: Group::everybody(),
        kernel_state: state.to_value().unwrap(),
        frozen: false,
        closed: false,
        cancelled: false,
        created_at: Timestamp::new(0),
    }
}
