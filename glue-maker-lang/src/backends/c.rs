use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::backends::clean_name;
use crate::{Backend, Hook, ShutdownArgs, StartupArgs, TypeEvent};

/// The glue source currently being generated, one per catalog entry.
#[derive(Debug)]
struct OpenScope {
    path: PathBuf,
    body: String,
}

/// Backend for hand-written native code and for every target that links
/// against the C codecs. Synchronous: one full startup/types/shutdown cycle
/// per catalog entry, producing one glue source per entry.
#[derive(Debug, Default)]
pub struct CBackend {
    scope: Mutex<Option<OpenScope>>,
}

impl CBackend {
    /// Make a new `CBackend`.
    pub fn new() -> CBackend {
        Default::default()
    }

    fn emit(&self, event: &TypeEvent, body_lines: &[String]) -> Result<()> {
        let param = event
            .param
            .context("The c backend only receives parameter-scoped calls")?;
        let mut guard = self.scope.lock().unwrap();
        let scope = guard
            .as_mut()
            .context("The c backend received a type before on_startup")?;
        let ty = clean_name(event.type_name);
        let param_id = clean_name(&param.param.id);
        let _ = writeln!(
            scope.body,
            "\nvoid {}_{}_convert(const asn1Scc{} *in, void *out)\n{{",
            param_id, ty, ty
        );
        for line in body_lines {
            let _ = writeln!(scope.body, "    {}", line);
        }
        let _ = writeln!(scope.body, "}}");
        Ok(())
    }
}

impl Backend for CBackend {
    fn name(&self) -> &'static str {
        "c"
    }

    fn is_asynchronous(&self) -> bool {
        false
    }

    fn version(&self) -> &'static str {
        "c glue generator 3.2"
    }

    fn implements(&self, hook: Hook) -> bool {
        !matches!(hook, Hook::Final)
    }

    fn on_startup(&self, args: &StartupArgs) -> Result<()> {
        let scope = args
            .scope
            .context("The c backend is synchronous and needs an interface scope")?;
        let mut body = String::new();
        let _ = writeln!(
            body,
            "/* Glue for {}.{} (types from {}) */",
            scope.interface.id,
            scope.implementation,
            args.registry_file.display()
        );
        let _ = writeln!(body, "#include \"asn1crt.h\"");
        if args.use_external_codecs {
            let _ = writeln!(body, "#include \"external_codecs.h\"");
        }
        let path = args.output_dir.join(format!(
            "{}_{}_glue.c",
            clean_name(&scope.interface.id),
            clean_name(scope.implementation)
        ));
        *self.scope.lock().unwrap() = Some(OpenScope { path, body });
        Ok(())
    }

    fn on_basic(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, &["memcpy(out, in, sizeof(*in));".to_string()])
    }

    fn on_sequence(&self, event: &TypeEvent) -> Result<()> {
        let lines = event
            .def
            .members
            .iter()
            .map(|member| format!("/* field {}: {} */", member.name, member.type_name))
            .collect::<Vec<_>>();
        self.emit(event, &lines)
    }

    fn on_set(&self, event: &TypeEvent) -> Result<()> {
        self.on_sequence(event)
    }

    fn on_choice(&self, event: &TypeEvent) -> Result<()> {
        let mut lines = vec!["switch (in->kind) {".to_string()];
        for member in &event.def.members {
            lines.push(format!(
                "case {}_PRESENT: /* {} */ break;",
                clean_name(&member.name),
                member.type_name
            ));
        }
        lines.push("}".to_string());
        self.emit(event, &lines)
    }

    fn on_sequence_of(&self, event: &TypeEvent) -> Result<()> {
        let elem = event.def.contained.as_deref().unwrap_or("NULL");
        self.emit(
            event,
            &[format!(
                "for (long i = 0; i < in->nCount; i++) {{ /* element: {} */ }}",
                elem
            )],
        )
    }

    fn on_set_of(&self, event: &TypeEvent) -> Result<()> {
        self.on_sequence_of(event)
    }

    fn on_enumerated(&self, event: &TypeEvent) -> Result<()> {
        self.emit(event, &["*(int *)out = (int)*in;".to_string()])
    }

    fn on_shutdown(&self, _args: &ShutdownArgs) -> Result<()> {
        let scope = self
            .scope
            .lock()
            .unwrap()
            .take()
            .context("The c backend shut down before on_startup")?;
        std::fs::write(&scope.path, scope.body)
            .with_context(|| format!("Cannot write {}", scope.path.display()))?;
        Ok(())
    }
}
