//! Plain-text rendering for complaints and actors.

use fixdesk_common::actor::Actor;
use fixdesk_common::complaint::Complaint;

/// One-line listing entry
pub fn summary_line(c: &Complaint) -> String {
    format!(
        "{}  {:<21}  {}  {} - {}{}",
        c.id,
        c.work_status.as_str(),
        c.filed_at.format("%Y-%m-%d"),
        c.department,
        c.description,
        if c.is_urgent { "  [URGENT]" } else { "" },
    )
}

/// One-line registry entry
pub fn actor_line(a: &Actor) -> String {
    match a.division {
        Some(division) => format!("{}  {:<13}  {} <{}>  [{}]", a.id, a.role, a.name, a.email, division),
        None => format!("{}  {:<13}  {} <{}>", a.id, a.role, a.name, a.email),
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Full complaint detail
pub fn detail(c: &Complaint) -> String {
    let mut out = String::new();

    out.push_str(&format!("Complaint {}\n", c.id));
    out.push_str(&format!(
        "  Filed:         {} by {} ({})\n",
        c.filed_at.format("%Y-%m-%d %H:%M UTC"),
        c.reported_by_name,
        c.complainant_id
    ));
    out.push_str(&format!("  Department:    {}\n", or_dash(&c.department)));
    out.push_str(&format!("  Description:   {}\n", or_dash(&c.description)));
    out.push_str(&format!("  Room/Location: {}\n", or_dash(&c.room_location)));
    out.push_str(&format!("  Dispatch no:   {}\n", or_dash(&c.dispatch_no)));
    out.push_str(&format!("  Requested by:  {}\n", or_dash(&c.requested_by)));
    out.push_str(&format!(
        "  Urgent:        {}\n",
        if c.is_urgent { "yes" } else { "no" }
    ));
    out.push_str(&format!("  Status:        {}\n", c.work_status));

    match (&c.assigned_division, &c.assigned_division_head_id) {
        (Some(division), Some(head)) => {
            out.push_str(&format!("  Division:      {} (head {})\n", division, head))
        }
        (Some(division), None) => out.push_str(&format!("  Division:      {}\n", division)),
        _ => out.push_str("  Division:      -\n"),
    }
    out.push_str(&format!(
        "  Assignee:      {}\n",
        c.assigned_to_id.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("  Work remarks:  {}\n", or_dash(&c.remarks)));
    match c.completion_date {
        Some(date) => out.push_str(&format!(
            "  Completed:     {}\n",
            date.format("%Y-%m-%d %H:%M UTC")
        )),
        None => out.push_str("  Completed:     -\n"),
    }

    match c.feedback.date {
        Some(date) => out.push_str(&format!(
            "  Feedback:      {} ({}) on {}\n",
            c.feedback.status,
            or_dash(&c.feedback.comment),
            date.format("%Y-%m-%d")
        )),
        None => out.push_str(&format!("  Feedback:      {}\n", c.feedback.status)),
    }
    out.push_str(&format!(
        "  Coordinator:   {}\n",
        or_dash(&c.coordinator_remarks)
    ));
    out.push_str(&format!(
        "  Closed:        {}, reopened {} time(s)\n",
        if c.is_closed { "yes" } else { "no" },
        c.reopened_count
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixdesk_common::actor::Role;
    use fixdesk_common::complaint::NewComplaint;

    #[test]
    fn test_detail_renders_every_section() {
        let complainant = Actor::new(
            "USR1001",
            "Asha Rao",
            "asha@example.edu",
            Role::Complainant,
            None,
        );
        let complaint = Complaint::file(
            &complainant,
            NewComplaint {
                department: "Library".into(),
                description: "Broken latch".into(),
                is_urgent: true,
                ..NewComplaint::default()
            },
        );

        let text = detail(&complaint);
        assert!(text.contains("Asha Rao"));
        assert!(text.contains("Status:        PENDING"));
        assert!(text.contains("Urgent:        yes"));
        assert!(text.contains("Assignee:      -"));
        assert!(text.contains("reopened 0 time(s)"));
    }

    #[test]
    fn test_actor_line_shows_division() {
        use fixdesk_common::division::Division;

        let head = Actor::new(
            "DVH3001",
            "Meera Iyer",
            "meera@example.edu",
            Role::DivisionHead,
            Some(Division::Civil),
        );
        let line = actor_line(&head);
        assert!(line.contains("DVH3001"));
        assert!(line.contains("[Civil]"));

        let coordinator = Actor::new("CMC2001", "Dev", "dev@example.edu", Role::Coordinator, None);
        assert!(!actor_line(&coordinator).contains('['));
    }
}
