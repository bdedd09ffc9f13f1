use std::path::PathBuf;

/// Host platform as named in FS-UAE release archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// Platform of the running binary, if it is one FS-UAE ships for.
    pub fn current() -> Option<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a Rust target OS name (`std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "macos" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Standard install location of FS-UAE.
    ///
    /// On Windows this depends on `%ProgramFiles%`; `None` if it is unset.
    pub fn default_binary_directory(&self) -> Option<PathBuf> {
        match self {
            Self::MacOs => Some(PathBuf::from("/Applications")),
            Self::Linux => Some(PathBuf::from("/usr/bin")),
            Self::Windows => std::env::var_os("ProgramFiles")
                .map(|dir| PathBuf::from(dir).join("FS-UAE")),
        }
    }

    /// Executable path relative to the binary directory.
    pub fn default_binary_name(&self) -> &'static str {
        match self {
            Self::MacOs => "FS-UAE.app/Contents/MacOS/fs-uae",
            Self::Windows => "fs-uae.exe",
            Self::Linux => "fs-uae",
        }
    }
}

/// CPU architecture in the vocabulary of FS-UAE build names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X86_64,
    Ppc,
}

impl Arch {
    /// Architecture of the running binary.
    pub fn current() -> Option<Self> {
        Self::from_machine(std::env::consts::ARCH, usize::BITS)
    }

    /// Normalize a machine name plus pointer width.
    ///
    /// Intel names resolve by width; PowerPC is only recognized as 32-bit.
    pub fn from_machine(machine: &str, bits: u32) -> Option<Self> {
        let machine = machine.to_ascii_lowercase();
        match machine.as_str() {
            "x86_64" | "x86-64" | "amd64" | "x86" | "i386" | "i486" | "i586" | "i686" => {
                match bits {
                    32 => Some(Self::X86),
                    64 => Some(Self::X86_64),
                    _ => None,
                }
            }
            m if m.starts_with("power") && bits == 32 => Some(Self::Ppc),
            _ => None,
        }
    }

    /// Parse an explicit architecture name given by the caller.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i486" | "i586" | "i686" => Some(Self::X86),
            "x86-64" | "x86_64" | "amd64" => Some(Self::X86_64),
            "ppc" | "powerpc" => Some(Self::Ppc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86-64",
            Self::Ppc => "ppc",
        }
    }
}
