/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command)` (pure, no mutation)
/// 2. **Evolve**: `aggregate.apply(event)` for each decided event
///
/// A rejected command leaves the aggregate exactly as it was.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: gymops_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        aggregate.apply(ev);
    }
    Ok(events)
}
