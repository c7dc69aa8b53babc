// NFT Raffle Client - Event log decoding
use log::debug;
use nft_raffle::events::{RaffleEvent, WinnerSelected};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

const PROGRAM_PREFIX: &str = "Program ";
const LOG_PREFIX: &str = "Program log: ";
const DATA_PREFIX: &str = "Program data: ";

/// Decode every event `program_id` logged itself.
///
/// The invoke stack is rebuilt from the `invoke`/`success`/`failed` lines so
/// that `Program data:` entries written by CPI'd programs are skipped.
pub fn parse_events(logs: &[String], program_id: &Pubkey) -> Vec<RaffleEvent> {
    let mut stack: Vec<Option<Pubkey>> = Vec::new();
    let mut events = Vec::new();

    for line in logs {
        // Free text written by a program, never a stack transition
        if line.starts_with(LOG_PREFIX) {
            continue;
        }
        if let Some(data) = line.strip_prefix(DATA_PREFIX) {
            if stack.last() != Some(&Some(*program_id)) {
                continue;
            }
            for field in data.split(' ') {
                match base64::decode(field) {
                    Ok(bytes) => events.extend(RaffleEvent::decode(&bytes)),
                    Err(e) => debug!("Skipping undecodable log data {:?}: {}", field, e),
                }
            }
        } else if let Some(rest) = line.strip_prefix(PROGRAM_PREFIX) {
            let mut words = rest.split(' ');
            let (program, action) = match (words.next(), words.next()) {
                (Some(program), Some(action)) => (program, action),
                _ => continue,
            };
            if action == "invoke" {
                stack.push(Pubkey::from_str(program).ok());
            } else if action == "success" || action.starts_with("failed") {
                stack.pop();
            }
        }
    }
    events
}

/// The first `WinnerSelected` event `program_id` logged
pub fn find_winner_selected(logs: &[String], program_id: &Pubkey) -> Option<WinnerSelected> {
    parse_events(logs, program_id)
        .into_iter()
        .map(|event| match event {
            RaffleEvent::WinnerSelected(event) => event,
        })
        .next()
}
