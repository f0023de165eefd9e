use anyhow::{bail, Context, Result};
use heck::{ToSnakeCase, ToUpperCamelCase};
use prost_types::{FileDescriptorProto, FileDescriptorSet, SourceCodeInfo};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::{env, fs};

const PROTO_ROOT: &str = "proto";
const DESCRIPTOR_SET: &str = "file_descriptor_set.bin";
const WELL_KNOWN_PACKAGE: &str = "google.protobuf";

// Field numbers used in `SourceCodeInfo` paths.
const FILE_SERVICE_FIELD: i32 = 6;
const SERVICE_METHOD_FIELD: i32 = 2;

#[derive(Debug)]
struct ServiceDef {
    package: String,
    name: String,
    proto_file: String,
    comment: String,
    methods: Vec<MethodDef>,
}

#[derive(Debug)]
struct MethodDef {
    route: String,
    input: String,
    output: String,
    rust_input: String,
    rust_output: String,
    deprecated: bool,
    comment: String,
}

impl ServiceDef {
    fn full_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Trait and client names tonic derives from the service name.
    fn trait_name(&self) -> String {
        to_upper_camel(&self.name)
    }

    /// Module prefix tonic uses for `<prefix>_client` / `<prefix>_server`.
    fn module_prefix(&self) -> String {
        naive_snake_case(&self.trait_name())
    }

    fn rust_package(&self) -> String {
        format!("crate::{}", rust_module_path(&self.package))
    }

    fn output_file(&self) -> String {
        format!("{}.{}.stubs.rs", self.package, self.name)
    }
}

impl MethodDef {
    fn rust_name(&self) -> String {
        to_snake(&self.route)
    }

    fn variant(&self) -> String {
        to_upper_camel(&self.route)
    }
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR is not set")?);
    let files = proto_files(Path::new(PROTO_ROOT))?;
    if files.is_empty() {
        bail!("No .proto files found under {PROTO_ROOT}");
    }

    let mut compiler = protox::Compiler::new([PROTO_ROOT])?;
    compiler.include_source_info(true).include_imports(true);
    compiler
        .open_files(&files)
        .with_context(|| format!("Failed to compile the schemas under {PROTO_ROOT}"))?;
    let fds = compiler.file_descriptor_set();
    fs::write(out_dir.join(DESCRIPTOR_SET), compiler.encode_file_descriptor_set())?;

    let mut config = prost_build::Config::new();
    config.enable_type_names();
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .out_dir(&out_dir)
        .compile_fds_with_config(config, fds.clone())
        .context("Failed to generate messages and services")?;

    let services = collect_services(&fds)?;
    for def in &services {
        let stubs = render_stubs(def)
            .with_context(|| format!("Failed to render stubs for {}", def.full_name()))?;
        fs::write(out_dir.join(def.output_file()), stubs)?;
    }
    fs::write(out_dir.join("registry.rs"), render_registry(&services)?)?;
    fs::write(out_dir.join("packages.rs"), render_packages(&fds, &services)?)?;

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={PROTO_ROOT}");

    Ok(())
}

/// Every `.proto` file under `root`, relative to it, sorted.
fn proto_files(root: &Path) -> Result<Vec<String>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "proto") {
                let relative = path.strip_prefix(root)?;
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                found.push(name);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Services declared by the vendored schemas, in file order.
fn collect_services(fds: &FileDescriptorSet) -> Result<Vec<ServiceDef>> {
    let packages: Vec<&str> = fds.file.iter().map(|f| f.package()).collect();
    let mut services = Vec::new();

    for file in fds.file.iter().filter(|f| f.package() != WELL_KNOWN_PACKAGE) {
        for (si, service) in file.service.iter().enumerate() {
            let full_name = format!("{}.{}", file.package(), service.name());
            if service.method.is_empty() {
                bail!("Service {full_name} declares no methods");
            }

            let mut methods = Vec::with_capacity(service.method.len());
            for (mi, method) in service.method.iter().enumerate() {
                if method.client_streaming() || method.server_streaming() {
                    bail!(
                        "{full_name}/{} is streaming; only unary methods get stubs",
                        method.name()
                    );
                }
                let input = method.input_type().trim_start_matches('.').to_string();
                let output = method.output_type().trim_start_matches('.').to_string();
                methods.push(MethodDef {
                    route: method.name().to_string(),
                    rust_input: rust_type_path(&packages, &input)?,
                    rust_output: rust_type_path(&packages, &output)?,
                    input,
                    output,
                    deprecated: method
                        .options
                        .as_ref()
                        .is_some_and(|options| options.deprecated()),
                    comment: leading_comment(
                        file,
                        &[FILE_SERVICE_FIELD, si as i32, SERVICE_METHOD_FIELD, mi as i32],
                    ),
                });
            }

            services.push(ServiceDef {
                package: file.package().to_string(),
                name: service.name().to_string(),
                proto_file: file.name().to_string(),
                comment: leading_comment(file, &[FILE_SERVICE_FIELD, si as i32]),
                methods,
            });
        }
    }

    Ok(services)
}

/// Leading comment attached to the element at `path`, one line per source line.
fn leading_comment(file: &FileDescriptorProto, path: &[i32]) -> String {
    let Some(SourceCodeInfo { location }) = file.source_code_info.as_ref() else {
        return String::new();
    };
    location
        .iter()
        .find(|loc| loc.path == path)
        .and_then(|loc| loc.leading_comments.as_deref())
        .map(|comment| {
            comment
                .lines()
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

/// Path of the Rust type prost generates for the message `name`.
fn rust_type_path(packages: &[&str], name: &str) -> Result<String> {
    let package = packages
        .iter()
        .copied()
        .filter(|p| name.starts_with(&format!("{p}.")))
        .max_by_key(|p| p.len())
        .with_context(|| format!("No package declares {name}"))?;
    let mut parts: Vec<&str> = name[package.len() + 1..].split('.').collect();
    let Some(ty) = parts.pop() else {
        bail!("Empty type name in {name}");
    };

    if package == WELL_KNOWN_PACKAGE {
        return Ok(format!("::prost_types::{}", to_upper_camel(ty)));
    }
    let mut path = format!("crate::{}", rust_module_path(package));
    for parent in parts {
        path.push_str("::");
        path.push_str(&to_snake(parent));
    }
    path.push_str("::");
    path.push_str(&to_upper_camel(ty));
    Ok(path)
}

/// Descriptor module, blocking client and `Unimplemented` impl for one service.
fn render_stubs(def: &ServiceDef) -> Result<String> {
    let Some(first) = def.methods.first() else {
        bail!("Service {} declares no methods", def.full_name());
    };
    let prefix = def.module_prefix();
    let full_name = def.full_name();
    let trait_name = def.trait_name();
    let mut out = String::new();

    // Descriptor module.
    writeln!(out, "/// Descriptors and method-id dispatch for `{full_name}`.")?;
    writeln!(out, "pub mod {prefix}_descriptor {{")?;
    writeln!(
        out,
        "    use crate::descriptor::{{MethodDescriptor, MethodKind, MethodSpec, ServiceDescriptor, ServiceSpec}};"
    )?;
    writeln!(out, "    use std::sync::OnceLock;\n")?;
    writeln!(out, "    /// Fully-qualified service name.")?;
    writeln!(out, "    pub const SERVICE_NAME: &str = {full_name:?};\n")?;
    writeln!(out, "    /// Static definition the descriptor is built from.")?;
    writeln!(out, "    pub static SPEC: ServiceSpec = ServiceSpec {{")?;
    writeln!(out, "        package: {:?},", def.package)?;
    writeln!(out, "        name: {:?},", def.name)?;
    writeln!(out, "        proto_file: {:?},", def.proto_file)?;
    writeln!(out, "        comment: {:?},", def.comment)?;
    writeln!(out, "        methods: &[")?;
    for method in &def.methods {
        writeln!(out, "            MethodSpec {{")?;
        writeln!(out, "                route: {:?},", method.route)?;
        writeln!(out, "                input_type: {:?},", method.input)?;
        writeln!(out, "                output_type: {:?},", method.output)?;
        writeln!(out, "                kind: MethodKind::Unary,")?;
        writeln!(out, "                deprecated: {},", method.deprecated)?;
        writeln!(out, "                comment: {:?},", method.comment)?;
        writeln!(out, "            }},")?;
    }
    writeln!(out, "        ],")?;
    writeln!(out, "    }};\n")?;

    writeln!(out, "    /// Methods of `{full_name}`, numbered in declaration order.")?;
    writeln!(out, "    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]")?;
    writeln!(out, "    pub enum Method {{")?;
    for (id, method) in def.methods.iter().enumerate() {
        writeln!(out, "        /// `{}`", method.route)?;
        writeln!(out, "        {} = {id},", method.variant())?;
    }
    writeln!(out, "    }}\n")?;

    writeln!(out, "    impl Method {{")?;
    writeln!(out, "        /// Every method, indexed by id.")?;
    write!(out, "        pub const ALL: [Method; {}] = [", def.methods.len())?;
    for method in &def.methods {
        write!(out, "Method::{}, ", method.variant())?;
    }
    writeln!(out, "];\n")?;
    writeln!(out, "        /// Position of the method in the service.")?;
    writeln!(out, "        pub const fn id(self) -> usize {{")?;
    writeln!(out, "            self as usize")?;
    writeln!(out, "        }}\n")?;
    writeln!(out, "        /// Look a method up by id.")?;
    writeln!(out, "        pub fn from_id(id: usize) -> Option<Self> {{")?;
    writeln!(out, "            Self::ALL.get(id).copied()")?;
    writeln!(out, "        }}\n")?;
    writeln!(out, "        /// Request path, e.g. `/{full_name}/{}`.", first.route)?;
    writeln!(out, "        pub const fn path(self) -> &'static str {{")?;
    writeln!(out, "            match self {{")?;
    for method in &def.methods {
        writeln!(
            out,
            "                Method::{} => \"/{full_name}/{}\",",
            method.variant(),
            method.route
        )?;
    }
    writeln!(out, "            }}")?;
    writeln!(out, "        }}\n")?;
    writeln!(out, "        /// Look a method up by request path.")?;
    writeln!(out, "        pub fn from_path(path: &str) -> Option<Self> {{")?;
    writeln!(out, "            match path {{")?;
    for method in &def.methods {
        writeln!(
            out,
            "                \"/{full_name}/{}\" => Some(Method::{}),",
            method.route,
            method.variant()
        )?;
    }
    writeln!(out, "                _ => None,")?;
    writeln!(out, "            }}")?;
    writeln!(out, "        }}\n")?;
    writeln!(out, "        /// Descriptor of this method.")?;
    writeln!(out, "        pub fn descriptor(self) -> &'static MethodDescriptor {{")?;
    writeln!(out, "            &descriptor().methods()[self.id()]")?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}\n")?;

    writeln!(out, "    /// Service descriptor, built on first use.")?;
    writeln!(out, "    pub fn descriptor() -> &'static ServiceDescriptor {{")?;
    writeln!(out, "        static DESCRIPTOR: OnceLock<ServiceDescriptor> = OnceLock::new();")?;
    writeln!(out, "        DESCRIPTOR.get_or_init(|| ServiceDescriptor::new(&SPEC))")?;
    writeln!(out, "    }}\n")?;

    writeln!(out, "    /// Decode `payload`, invoke method `id` on `service` and encode the reply.")?;
    writeln!(out, "    pub async fn dispatch<T>(")?;
    writeln!(out, "        service: &T,")?;
    writeln!(out, "        id: usize,")?;
    writeln!(out, "        payload: &[u8],")?;
    writeln!(out, "    ) -> Result<Vec<u8>, tonic::Status>")?;
    writeln!(out, "    where")?;
    writeln!(out, "        T: super::{prefix}_server::{trait_name},")?;
    writeln!(out, "    {{")?;
    writeln!(out, "        let method = Method::from_id(id).ok_or_else(|| {{")?;
    writeln!(
        out,
        "            tonic::Status::unimplemented(format!(\"Method id {{id}} is not defined for {{SERVICE_NAME}}\"))"
    )?;
    writeln!(out, "        }})?;")?;
    writeln!(out, "        match method {{")?;
    for method in &def.methods {
        writeln!(out, "            Method::{} => {{", method.variant())?;
        writeln!(
            out,
            "                let request = <{} as prost::Message>::decode(payload)",
            method.rust_input
        )?;
        writeln!(
            out,
            "                    .map_err(|e| tonic::Status::invalid_argument(e.to_string()))?;"
        )?;
        writeln!(
            out,
            "                let response = service.{}(tonic::Request::new(request)).await?;",
            method.rust_name()
        )?;
        writeln!(
            out,
            "                Ok(prost::Message::encode_to_vec(response.get_ref()))"
        )?;
        writeln!(out, "            }}")?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}\n")?;

    // Blocking client.
    let client = format!("{trait_name}Client");
    let blocking = format!("{trait_name}BlockingClient");
    writeln!(out, "/// Blocking client for `{full_name}`.")?;
    writeln!(out, "pub mod {prefix}_blocking {{")?;
    writeln!(out, "    use super::{prefix}_client::{client};")?;
    writeln!(out, "    use std::sync::Arc;")?;
    writeln!(out, "    use tokio::runtime::Runtime;")?;
    writeln!(out, "    use tonic::transport::{{Channel, Endpoint}};\n")?;
    writeln!(out, "    /// Drives a [`{client}`] to completion on an owned runtime.")?;
    writeln!(out, "    #[derive(Debug, Clone)]")?;
    writeln!(out, "    pub struct {blocking} {{")?;
    writeln!(out, "        inner: {client}<Channel>,")?;
    writeln!(out, "        runtime: Arc<Runtime>,")?;
    writeln!(out, "    }}\n")?;
    writeln!(out, "    impl {blocking} {{")?;
    writeln!(out, "        /// Connect eagerly to `dst`.")?;
    writeln!(out, "        pub fn connect<D>(dst: D) -> Result<Self, crate::Error>")?;
    writeln!(out, "        where")?;
    writeln!(out, "            D: TryInto<Endpoint>,")?;
    writeln!(out, "            D::Error: Into<tonic::codegen::StdError>,")?;
    writeln!(out, "        {{")?;
    writeln!(out, "            let runtime = crate::blocking::runtime()?;")?;
    writeln!(out, "            let inner = runtime.block_on({client}::connect(dst))?;")?;
    writeln!(out, "            Ok(Self {{ inner, runtime }})")?;
    writeln!(out, "        }}\n")?;
    writeln!(out, "        /// Wrap an existing channel, sharing `runtime` with other clients.")?;
    writeln!(out, "        pub fn with_runtime(channel: Channel, runtime: Arc<Runtime>) -> Self {{")?;
    writeln!(out, "            Self {{")?;
    writeln!(out, "                inner: {client}::new(channel),")?;
    writeln!(out, "                runtime,")?;
    writeln!(out, "            }}")?;
    writeln!(out, "        }}\n")?;
    writeln!(out, "        /// The async client underneath.")?;
    writeln!(out, "        pub fn into_inner(self) -> {client}<Channel> {{")?;
    writeln!(out, "            self.inner")?;
    writeln!(out, "        }}")?;
    for method in &def.methods {
        writeln!(out)?;
        for line in method.comment.lines() {
            writeln!(out, "        /// {line}")?;
        }
        if method.deprecated {
            writeln!(out, "        #[deprecated]")?;
            writeln!(out, "        #[allow(deprecated)]")?;
        }
        writeln!(out, "        pub fn {}(", method.rust_name())?;
        writeln!(out, "            &mut self,")?;
        writeln!(
            out,
            "            request: impl tonic::IntoRequest<{}>,",
            method.rust_input
        )?;
        writeln!(
            out,
            "        ) -> Result<tonic::Response<{}>, tonic::Status> {{",
            method.rust_output
        )?;
        writeln!(
            out,
            "            self.runtime.block_on(self.inner.{}(request))",
            method.rust_name()
        )?;
        writeln!(out, "        }}")?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "}}\n")?;

    // Server base.
    writeln!(out, "#[tonic::async_trait]")?;
    writeln!(out, "impl {prefix}_server::{trait_name} for crate::Unimplemented {{")?;
    for (i, method) in def.methods.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "    async fn {}(", method.rust_name())?;
        writeln!(out, "        &self,")?;
        writeln!(out, "        _request: tonic::Request<{}>,", method.rust_input)?;
        writeln!(
            out,
            "    ) -> std::result::Result<tonic::Response<{}>, tonic::Status> {{",
            method.rust_output
        )?;
        writeln!(
            out,
            "        Err(crate::descriptor::unimplemented({prefix}_descriptor::Method::{}.descriptor()))",
            method.variant()
        )?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")?;

    Ok(out)
}

/// Registry of every compiled service.
fn render_registry(defs: &[ServiceDef]) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "/// Descriptors of every compiled service, in schema order.")?;
    writeln!(
        out,
        "pub(crate) fn service_descriptors() -> Vec<&'static crate::descriptor::ServiceDescriptor> {{"
    )?;
    writeln!(out, "    vec![")?;
    for def in defs {
        writeln!(
            out,
            "        {}::{}_descriptor::descriptor(),",
            def.rust_package(),
            def.module_prefix()
        )?;
    }
    writeln!(out, "    ]")?;
    writeln!(out, "}}\n")?;

    writeln!(out, "/// Mount [`Unimplemented`](crate::Unimplemented) for every service `include` accepts.")?;
    writeln!(out, "pub(crate) fn mount_unimplemented<F>(")?;
    writeln!(out, "    routes: &mut tonic::service::RoutesBuilder,")?;
    writeln!(out, "    mut include: F,")?;
    writeln!(out, ") -> Vec<&'static str>")?;
    writeln!(out, "where")?;
    writeln!(out, "    F: FnMut(&str) -> bool,")?;
    writeln!(out, "{{")?;
    writeln!(out, "    let mut mounted = Vec::new();")?;
    for def in defs {
        let prefix = def.module_prefix();
        let package = def.rust_package();
        writeln!(out, "    if include({package}::{prefix}_descriptor::SERVICE_NAME) {{")?;
        writeln!(
            out,
            "        routes.add_service({package}::{prefix}_server::{}Server::new(crate::Unimplemented));",
            def.trait_name()
        )?;
        writeln!(out, "        mounted.push({package}::{prefix}_descriptor::SERVICE_NAME);")?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "    mounted")?;
    writeln!(out, "}}\n")?;

    writeln!(out, "/// Run method `id` of `service` against [`Unimplemented`](crate::Unimplemented).")?;
    writeln!(out, "pub(crate) async fn dispatch_unimplemented(")?;
    writeln!(out, "    service: &str,")?;
    writeln!(out, "    id: usize,")?;
    writeln!(out, "    payload: &[u8],")?;
    writeln!(out, ") -> Result<Vec<u8>, tonic::Status> {{")?;
    writeln!(out, "    match service {{")?;
    for def in defs {
        writeln!(
            out,
            "        {:?} => {}::{}_descriptor::dispatch(&crate::Unimplemented, id, payload).await,",
            def.full_name(),
            def.rust_package(),
            def.module_prefix()
        )?;
    }
    writeln!(
        out,
        "        _ => Err(tonic::Status::unimplemented(format!(\"Unknown service {{service}}\"))),"
    )?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;

    Ok(out)
}

#[derive(Debug, Default)]
struct PackageNode {
    package: Option<String>,
    stubs: Vec<String>,
    children: BTreeMap<String, PackageNode>,
}

/// Module tree mirroring the protobuf packages, with the generated code included.
fn render_packages(fds: &FileDescriptorSet, defs: &[ServiceDef]) -> Result<String> {
    let mut root = PackageNode::default();
    for file in fds.file.iter().filter(|f| f.package() != WELL_KNOWN_PACKAGE) {
        let mut node = &mut root;
        for segment in file.package().split('.') {
            node = node.children.entry(to_snake(segment)).or_default();
        }
        node.package = Some(file.package().to_string());
    }
    for def in defs {
        let mut node = &mut root;
        for segment in def.package.split('.') {
            node = node.children.entry(to_snake(segment)).or_default();
        }
        node.stubs.push(def.output_file());
    }

    let mut out = String::new();
    for (name, child) in &root.children {
        render_package_node(&mut out, name, name, child, 0)?;
    }
    Ok(out)
}

fn render_package_node(
    out: &mut String,
    name: &str,
    path: &str,
    node: &PackageNode,
    depth: usize,
) -> Result<()> {
    let indent = "    ".repeat(depth);
    match &node.package {
        Some(package) => writeln!(out, "{indent}/// Messages and services of `{package}`.")?,
        None => writeln!(out, "{indent}/// Packages under `{path}`.")?,
    }
    if depth == 0 {
        writeln!(out, "{indent}#[allow(missing_docs, clippy::all)]")?;
    }
    writeln!(out, "{indent}pub mod {name} {{")?;
    if let Some(package) = &node.package {
        let file = package.split('.').map(to_snake).collect::<Vec<_>>().join(".");
        writeln!(out, "{indent}    include!(concat!(env!(\"OUT_DIR\"), \"/{file}.rs\"));")?;
    }
    for stubs in &node.stubs {
        writeln!(out, "{indent}    include!(concat!(env!(\"OUT_DIR\"), \"/{stubs}\"));")?;
    }
    for (child_name, child) in &node.children {
        writeln!(out)?;
        render_package_node(out, child_name, &format!("{path}.{child_name}"), child, depth + 1)?;
    }
    writeln!(out, "{indent}}}")?;
    Ok(())
}

fn rust_module_path(package: &str) -> String {
    package.split('.').map(to_snake).collect::<Vec<_>>().join("::")
}

/// Same word splitting tonic uses for its module names.
fn naive_snake_case(name: &str) -> String {
    let mut s = String::new();
    let mut it = name.chars().peekable();
    while let Some(x) = it.next() {
        s.push(x.to_ascii_lowercase());
        if let Some(y) = it.peek() {
            if y.is_uppercase() {
                s.push('_');
            }
        }
    }
    s
}

/// Field and module names, as prost writes them.
fn to_snake(s: &str) -> String {
    sanitize_identifier(&s.to_snake_case())
}

/// Type and variant names, as prost writes them.
fn to_upper_camel(s: &str) -> String {
    sanitize_identifier(&s.to_upper_camel_case())
}

fn sanitize_identifier(ident: &str) -> String {
    match ident {
        "as" | "break" | "const" | "continue" | "else" | "enum" | "false" | "fn" | "for" | "if"
        | "impl" | "in" | "let" | "loop" | "match" | "mod" | "move" | "mut" | "pub" | "ref"
        | "return" | "static" | "struct" | "trait" | "true" | "type" | "unsafe" | "use"
        | "where" | "while" | "dyn" | "abstract" | "become" | "box" | "do" | "final" | "macro"
        | "override" | "priv" | "typeof" | "unsized" | "virtual" | "yield" | "async" | "await"
        | "try" => format!("r#{ident}"),
        "_" | "super" | "self" | "Self" | "extern" | "crate" => format!("{ident}_"),
        s if s.starts_with(|c: char| c.is_numeric()) => format!("_{ident}"),
        _ => ident.to_string(),
    }
}
