use crate::dfa::fmt_symbol;
use crate::Dfa;
use std::io;
use std::io::Write;

impl Dfa {
    /// Renders this automaton as a Graphviz digraph.
    /// Accepting states are drawn as double circles, the start state has an incoming arrow.
    pub fn output_dot(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "digraph {{")?;
        writeln!(w, "rankdir=LR")?;

        if let Some(start) = self.start {
            writeln!(w, "start [shape=point]")?;
            writeln!(w, "start -> id{start}")?;
        }

        for (src, state) in &self.states {
            let attrs = if state.is_accepting() {
                ", shape=doublecircle"
            } else {
                ""
            };
            writeln!(w, "node[label=\"{src}\"{attrs}] id{src}")?;

            let edges = state
                .transition_table
                .iter()
                .map(|(&sym, tgt)| (Some(sym), tgt))
                .chain(state.default_transition.as_ref().map(|tgt| (None, tgt)));
            for (sym, tgt) in edges {
                let label = fmt_symbol(sym).escape_default().to_string();
                writeln!(w, "id{src} -> id{tgt} [label=\"{label}\"]")?;
            }
        }

        writeln!(w, "}}")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;
    use pretty_assertions::assert_eq;

    #[test]
    fn dot_output() {
        let mut out = Vec::new();
        compile("a[^b]").unwrap().output_dot(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "digraph {\n\
             rankdir=LR\n\
             start [shape=point]\n\
             start -> id0\n\
             node[label=\"0\"] id0\n\
             id0 -> id1 [label=\"a\"]\n\
             node[label=\"1\"] id1\n\
             id1 -> id2 [label=\"b\"]\n\
             id1 -> id3 [label=\"ANY\"]\n\
             node[label=\"2\"] id2\n\
             node[label=\"3\", shape=doublecircle] id3\n\
             }\n"
        );
    }
}
