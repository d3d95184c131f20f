use std::collections::HashSet;
use std::net::SocketAddr;

use colored::Colorize;
use comfy_table::{Cell, Color, Table};

use crate::types::{Connection, Process};

/// Identity of a connection across scans.
pub type ConnectionKey = (SocketAddr, SocketAddr);

pub fn connection_key(conn: &Connection) -> ConnectionKey {
    (conn.local(), conn.remote())
}

pub fn print_connections(connections: &[Connection]) {
    print_connections_watch(connections, &HashSet::new())
}

pub fn print_connections_watch(connections: &[Connection], new: &HashSet<ConnectionKey>) {
    if connections.is_empty() {
        println!("{}", "No connections found".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["PROTO", "LOCAL", "REMOTE", "PID", "COMM"]);

    let mut new_count = 0;
    for conn in connections {
        let is_new = new.contains(&connection_key(conn));
        if is_new {
            new_count += 1;
        }
        let row_color = if is_new { Color::Green } else { Color::Reset };

        let (pid, comm) = match &conn.process {
            Some(p) => (p.pid.to_string(), p.comm.as_str()),
            None => ("-".to_string(), "-"),
        };

        table.add_row(vec![
            Cell::new(conn.transport).fg(if is_new { Color::Green } else { Color::Cyan }),
            Cell::new(conn.local()).fg(row_color),
            Cell::new(conn.remote()).fg(row_color),
            Cell::new(pid).fg(row_color),
            Cell::new(comm).fg(row_color),
        ]);
    }

    println!("{table}");
    print_count(connections.len(), new_count);
}

pub fn print_processes(processes: &[Process]) {
    if processes.is_empty() {
        println!("{}", "No processes found".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["PID", "PPID", "THREADS", "SOCKETS", "FILES", "COMM", "CMDLINE"]);

    for p in processes {
        let cmdline = if p.cmdline.is_empty() { "-" } else { p.cmdline.as_str() };
        table.add_row(vec![
            Cell::new(p.pid).fg(Color::Cyan),
            Cell::new(p.ppid),
            Cell::new(p.threads),
            Cell::new(p.inodes.len()),
            Cell::new(p.open_files_count),
            Cell::new(&p.comm),
            Cell::new(truncate(cmdline, 60)),
        ]);
    }

    println!("{table}");
    print_count(processes.len(), 0);
}

/// Print a parent chain, starting process first.
pub fn print_chain(chain: &[&Process]) {
    for (depth, p) in chain.iter().enumerate() {
        let indent = "  ".repeat(depth);
        let marker = if depth == 0 { "" } else { "└─ " };
        println!(
            "{indent}{marker}{} {}",
            p.pid.to_string().cyan(),
            p.comm.bold()
        );
    }
}

fn print_count(total: usize, new: usize) {
    let count_str = total.to_string();
    if new == 0 {
        println!("\n{} result(s)", count_str.green());
    } else {
        println!(
            "\n{} result(s) ({} new)",
            count_str.green(),
            new.to_string().green().bold()
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("nginx", 10), "nginx");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn test_connection_key_ignores_owner() {
        let a = Connection::tcp(
            "10.0.0.1:50000".parse().unwrap(),
            "10.0.0.2:443".parse().unwrap(),
            1,
        );
        let mut b = a.copy();
        b.process = Some(Process::default());

        assert_eq!(connection_key(&a), connection_key(&b));
    }
}
