//! Built-in registry tables.
//!
//! Revise these when a supported interpreter release adds or removes
//! standard-library modules, and bump [`REGISTRY_VERSION`].

/// Version of the compiled-in tables.
pub const REGISTRY_VERSION: &str = "2025.2";

/// Interpreter releases whose standard library is covered by [`STDLIB_MODULES`].
pub const SUPPORTED_PYTHON: &[&str] = &["3.8", "3.9", "3.10", "3.11", "3.12", "3.13"];

/// Union of top-level standard-library modules across [`SUPPORTED_PYTHON`].
pub const STDLIB_MODULES: &[&str] = &[
    "__future__", "__main__", "_thread", "abc", "aifc", "argparse", "array", "ast",
    "asynchat", "asyncio", "asyncore", "atexit", "audioop", "base64", "bdb", "binascii",
    "binhex", "bisect", "builtins", "bz2", "cProfile", "calendar", "cgi", "cgitb", "chunk",
    "cmath", "cmd", "code", "codecs", "codeop", "collections", "colorsys", "compileall",
    "concurrent", "configparser", "contextlib", "contextvars", "copy", "copyreg", "crypt",
    "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib",
    "dis", "distutils", "doctest", "email", "encodings", "ensurepip", "enum", "errno",
    "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch", "fractions", "ftplib",
    "functools", "gc", "genericpath", "getopt", "getpass", "gettext", "glob", "graphlib",
    "grp", "gzip", "hashlib", "heapq", "hmac", "html", "http", "idlelib", "imaplib",
    "imghdr", "imp", "importlib", "inspect", "io", "ipaddress", "itertools", "json",
    "keyword", "lib2to3", "linecache", "locale", "logging", "lzma", "mailbox", "mailcap",
    "marshal", "math", "mimetypes", "mmap", "modulefinder", "msilib", "msvcrt",
    "multiprocessing", "netrc", "nis", "nntplib", "nt", "ntpath", "numbers", "opcode",
    "operator", "optparse", "os", "ossaudiodev", "pathlib", "pdb", "pickle", "pickletools",
    "pipes", "pkgutil", "platform", "plistlib", "poplib", "posix", "posixpath", "pprint",
    "profile", "pstats", "pty", "pwd", "py_compile", "pyclbr", "pydoc", "pyexpat", "queue",
    "quopri", "random", "re", "readline", "reprlib", "resource", "rlcompleter", "runpy",
    "sched", "secrets", "select", "selectors", "shelve", "shlex", "shutil", "signal", "site",
    "smtpd", "smtplib", "sndhdr", "socket", "socketserver", "spwd", "sqlite3", "sre_compile",
    "sre_constants", "sre_parse", "ssl", "stat", "statistics", "string", "stringprep",
    "struct", "subprocess", "sunau", "symtable", "sys", "sysconfig", "syslog", "tabnanny",
    "tarfile", "telnetlib", "tempfile", "termios", "test", "textwrap", "threading", "time",
    "timeit", "tkinter", "token", "tokenize", "tomllib", "trace", "traceback", "tracemalloc",
    "tty", "turtle", "turtledemo", "types", "typing", "unicodedata", "unittest", "urllib",
    "uu", "uuid", "venv", "warnings", "wave", "weakref", "webbrowser", "winreg", "winsound",
    "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib",
    "zoneinfo",
];

/// Import name to distribution name. Earlier rows win for the inverse lookup.
pub const DISTRIBUTION_NAMES: &[(&str, &str)] = &[
    ("PIL", "Pillow"),
    ("cv2", "opencv-python"),
    ("sklearn", "scikit-learn"),
    ("skimage", "scikit-image"),
    ("yaml", "PyYAML"),
    ("bs4", "beautifulsoup4"),
    ("dateutil", "python-dateutil"),
    ("dotenv", "python-dotenv"),
    ("jwt", "PyJWT"),
    ("serial", "pyserial"),
    ("wx", "wxPython"),
    ("gi", "PyGObject"),
    ("cairo", "pycairo"),
    ("OpenGL", "PyOpenGL"),
    ("usb", "pyusb"),
    ("Crypto", "pycryptodome"),
    ("google", "google-api-python-client"),
    ("attr", "attrs"),
    ("OpenSSL", "pyOpenSSL"),
    ("win32api", "pywin32"),
    ("win32con", "pywin32"),
    ("win32gui", "pywin32"),
    ("pythoncom", "pywin32"),
    ("pywintypes", "pywin32"),
    ("magic", "python-magic"),
    ("docx", "python-docx"),
    ("pptx", "python-pptx"),
    ("fitz", "PyMuPDF"),
    ("git", "GitPython"),
    ("websocket", "websocket-client"),
    ("socks", "PySocks"),
    ("zmq", "pyzmq"),
    ("MySQLdb", "mysqlclient"),
    ("Xlib", "python-xlib"),
    ("pkg_resources", "setuptools"),
    ("PyInstaller", "pyinstaller"),
];

/// Runtime-only modules that static scanning cannot see.
pub const IMPLICIT_DEPENDENCIES: &[(&str, &[&str])] = &[
    ("PIL", &["PIL._tkinter_finder"]),
    ("tkinter", &["tkinter.filedialog", "tkinter.messagebox", "tkinter.ttk"]),
    ("pkg_resources", &["pkg_resources.py2_warn", "pkg_resources.markers"]),
    (
        "sklearn",
        &[
            "sklearn.utils._typedefs",
            "sklearn.utils._heap",
            "sklearn.utils._sorting",
            "sklearn.utils._vector_sentinel",
            "sklearn.neighbors._partition_nodes",
        ],
    ),
    ("scipy", &["scipy.special.cython_special", "scipy._lib.messagestream"]),
    ("pandas", &["pandas._libs.tslibs.base"]),
    ("matplotlib", &["matplotlib.backends.backend_tkagg"]),
    ("cv2", &["numpy"]),
    ("sqlalchemy", &["sqlalchemy.sql.default_comparator"]),
    ("passlib", &["passlib.handlers.bcrypt"]),
    ("engineio", &["engineio.async_drivers.threading"]),
    ("pyttsx3", &["pyttsx3.drivers", "pyttsx3.drivers.sapi5"]),
    ("babel", &["babel.numbers"]),
];

/// Packages whose submodules are loaded lazily and benefit from full collection.
pub const COMPLEX_PACKAGES: &[&str] = &[
    "babel",
    "engineio",
    "kivy",
    "matplotlib",
    "pandas",
    "plotly",
    "pygame",
    "pyttsx3",
    "skimage",
    "sklearn",
    "socketio",
    "sqlalchemy",
];

/// Complex packages whose full collection is prohibitively slow.
pub const GIANT_PACKAGES: &[&str] = &[
    "PyQt5",
    "PyQt6",
    "PySide2",
    "PySide6",
    "cv2",
    "numpy",
    "scipy",
    "tensorflow",
    "torch",
    "transformers",
];

/// Packages that read their own installed-distribution metadata at runtime.
pub const METADATA_REQUIRED: &[&str] = &[
    "filelock",
    "gradio",
    "huggingface_hub",
    "imageio",
    "regex",
    "safetensors",
    "streamlit",
    "tokenizers",
    "tqdm",
    "transformers",
];

/// Packages never bundled: the packaging tool itself and dev tooling.
pub const DENIED_MODULES: &[&str] = &[
    "IPython",
    "PyInstaller",
    "_pytest",
    "black",
    "flake8",
    "jupyter",
    "mypy",
    "nose",
    "notebook",
    "pip",
    "pylint",
    "pytest",
    "setuptools",
    "sphinx",
    "twine",
    "wheel",
];

/// Dotted prefixes that must never become hidden imports.
pub const DENIED_PREFIXES: &[&str] = &[
    "matplotlib.tests",
    "numpy.array_api",
    "numpy.distutils",
    "numpy.f2py",
    "numpy.testing",
    "scipy.spatial.cKDTree",
];

/// Submodules added to every analysis.
pub const BASELINE_HIDDEN_IMPORTS: &[&str] = &["atexit", "encodings.gbk", "encodings.utf_8"];

/// Binaries known to corrupt when UPX-compressed.
pub const COMPRESSION_UNSAFE: &[&str] = &[
    "Qt5Core.dll",
    "Qt6Core.dll",
    "libcrypto-3.dll",
    "msvcp140.dll",
    "python3.dll",
    "qwindows.dll",
    "vcruntime140.dll",
    "vcruntime140_1.dll",
];
