//! Compiled-in intent table.

use super::{IntentSource, RegistryBuilder};
use crate::error::Result;

type Table = &'static [(&'static str, &'static [&'static str])];

pub const INTENT_SIGNATURES: Table = &[
    (
        "http request",
        &[
            "requests.get", "requests.post", "requests.put", "requests.delete",
            "requests.head", "requests.options", "requests.patch",
            "requests.Session", "requests.request",
            "urllib.request.urlopen", "urllib3.PoolManager.request",
            "http.client.HTTPConnection", "http.client.HTTPSConnection",
            "httpx.get", "httpx.post", "httpx.put", "httpx.delete", "httpx.request",
            "aiohttp.ClientSession.get", "aiohttp.ClientSession.post", "aiohttp.request",
            "tornado.httpclient.AsyncHTTPClient.fetch",
            "tornado.httpclient.HTTPClient.fetch",
        ],
    ),
    (
        "file encryption",
        &[
            "cryptography.fernet.Fernet", "Fernet",
            "AES.new", "Crypto.Cipher.AES.new",
            "Crypto.Cipher.ChaCha20.new", "ChaCha20Poly1305.new",
            "hashlib.md5", "hashlib.sha256", "hashlib.sha512", "hashlib.blake2b",
            "hmac.new", "hashlib.pbkdf2_hmac", "scrypt",
            "rsa.encrypt", "RSA.import_key", "Crypto.PublicKey.RSA.generate",
        ],
    ),
    (
        "shell exec",
        &[
            "os.system", "os.popen", "subprocess.run", "subprocess.Popen",
            "subprocess.call", "subprocess.check_output", "subprocess.check_call",
            "commands.getoutput", "pexpect.spawn", "shlex.split",
            "fabric.Connection", "paramiko.SSHClient",
        ],
    ),
    (
        "database access",
        &[
            "sqlite3.connect", "psycopg2.connect", "pymysql.connect",
            "mysql.connector.connect", "sqlalchemy.create_engine",
            "cursor.execute", "engine.execute",
            "pymongo.MongoClient", "redis.Redis",
            "motor.motor_asyncio.AsyncIOMotorClient",
            "boto3.resource", "boto3.client",
            "neo4j.GraphDatabase.driver", "elasticsearch.Elasticsearch",
        ],
    ),
    (
        "file io",
        &[
            "open", "Path.open", "Path.write_text", "Path.read_text",
            "os.remove", "os.unlink", "os.rename",
            "os.mkdir", "os.makedirs", "shutil.copy", "shutil.move",
            "shutil.rmtree", "tempfile.NamedTemporaryFile",
            "tempfile.TemporaryDirectory", "glob.glob", "os.walk",
        ],
    ),
    (
        "json",
        &[
            "json.load", "json.loads", "json.dump", "json.dumps",
            "simplejson.loads", "simplejson.dumps",
            "ujson.loads", "ujson.dumps",
        ],
    ),
    (
        "xml",
        &[
            "xml.etree.ElementTree.parse", "xml.etree.ElementTree.fromstring",
            "lxml.etree.parse", "lxml.objectify.fromstring",
            "xml.dom.minidom.parseString", "xml.sax.make_parser",
            "bs4.BeautifulSoup", "BeautifulSoup",
        ],
    ),
    (
        "yaml",
        &[
            "yaml.safe_load", "yaml.load", "yaml.FullLoader", "yaml.RoundTripLoader",
            "ruamel.yaml.YAML", "ruamel.yaml.round_trip_load",
        ],
    ),
    (
        "csv",
        &[
            "csv.reader", "csv.writer", "csv.DictReader", "csv.DictWriter",
            "pandas.read_csv", "pandas.DataFrame.to_csv",
            "numpy.loadtxt", "numpy.savetxt",
        ],
    ),
    (
        "regex",
        &[
            "re.search", "re.match", "re.findall", "re.sub", "re.compile",
            "regex.search", "regex.match",
        ],
    ),
    (
        "logging",
        &[
            "logging.debug", "logging.info", "logging.warning",
            "logging.error", "logging.critical", "logger.log",
            "print", "warnings.warn", "sys.stderr.write",
        ],
    ),
    (
        "threading",
        &[
            "threading.Thread", "concurrent.futures.ThreadPoolExecutor",
            "concurrent.futures.ProcessPoolExecutor",
            "multiprocessing.Process", "multiprocessing.Pool",
            "multiprocessing.dummy.Pool",
        ],
    ),
    (
        "async tasks",
        &[
            "asyncio.create_task", "asyncio.run", "asyncio.gather",
            "asyncio.ensure_future", "trio.run", "curio.run", "anyio.run",
        ],
    ),
    (
        "socket",
        &[
            "socket.socket", "socket.bind", "socket.listen", "socket.connect",
            "ssl.wrap_socket", "ssl.SSLContext", "asyncio.open_connection",
            "asyncio.start_server", "websockets.connect", "websockets.serve",
        ],
    ),
    (
        "http server",
        &[
            "http.server.HTTPServer", "http.server.SimpleHTTPRequestHandler",
            "flask.Flask", "FastAPI", "django.urls", "Sanic",
            "bottle.Bottle", "tornado.web.Application", "aiohttp.web.Application",
        ],
    ),
    (
        "compression",
        &[
            "zipfile.ZipFile", "tarfile.open", "gzip.open",
            "bz2.BZ2File", "lzma.open", "shutil.make_archive",
            "patoolib.extract_archive",
        ],
    ),
    (
        "image processing",
        &[
            "PIL.Image.open", "PIL.Image.save", "cv2.imread", "cv2.imwrite",
            "cv2.VideoCapture", "skimage.io.imread", "skimage.io.imsave",
            "Image.fromarray", "matplotlib.pyplot.imshow",
        ],
    ),
    (
        "cli parsing",
        &[
            "argparse.ArgumentParser", "click.command", "typer.Typer",
            "optparse.OptionParser", "docopt.docopt",
        ],
    ),
    (
        "caching",
        &[
            "functools.lru_cache", "cachetools.Cache", "django.core.cache",
            "redis_cache.Cache", "dogpile.cache", "memcache.Client",
        ],
    ),
    (
        "email sending",
        &[
            "smtplib.SMTP", "smtplib.SMTP_SSL",
            "email.mime.text.MIMEText", "EmailMessage",
            "yagmail.SMTP", "send_email",
        ],
    ),
    (
        "validation",
        &[
            "pydantic.BaseModel", "validate_email", "cerberus.Validator",
            "marshmallow.Schema", "jsonschema.validate",
        ],
    ),
    (
        "authentication",
        &[
            "jwt.encode", "jwt.decode", "pyjwt.decode",
            "werkzeug.security", "bcrypt.hashpw", "bcrypt.checkpw",
        ],
    ),
    (
        "error handling",
        &[
            "logging.exception", "traceback.print_exc", "traceback.format_exc",
            "sys.exc_info",
        ],
    ),
];

// Each alias appears once. `redis` belongs to caching and `error` to error
// handling.
pub const INTENT_ALIASES: Table = &[
    ("http request", &["http", "url", "req", "request", "httpx", "urllib"]),
    ("file encryption", &["encrypt", "crypto", "AES", "Fernet", "KDF", "hash"]),
    ("shell exec", &["shell", "exec", "bash", "sh", "system", "cmd", "subprocess"]),
    ("database access", &["database", "db", "sql", "nosql", "mongo"]),
    ("file io", &["file", "io", "fs", "filesystem", "path", "read", "write"]),
    ("json", &["json", "serialize", "deserialize", "simplejson", "ujson"]),
    ("xml", &["xml", "xslt", "dom", "sax", "beautifulsoup", "bs4", "lxml"]),
    ("yaml", &["yaml", "yml", "config", "settings", "ruamel"]),
    ("csv", &["csv", "table", "spreadsheet", "tsv", "pandas", "numpy"]),
    ("regex", &["regex", "re", "pattern", "regexp"]),
    ("logging", &["log", "logger", "warning", "print"]),
    ("threading", &["thread", "threads", "parallel", "multiprocessing"]),
    ("async tasks", &["async", "asyncio", "trio", "curio", "anyio"]),
    ("socket", &["socket", "ssl", "websocket", "tcp", "udp"]),
    ("http server", &["server", "flask", "fastapi", "django", "sanic", "bottle"]),
    ("compression", &["zip", "tar", "gzip", "bz2", "lzma", "archive", "compress"]),
    ("image processing", &["image", "pil", "opencv", "cv2", "skimage", "matplotlib"]),
    ("cli parsing", &["cli", "argparse", "click", "typer", "optparse", "docopt"]),
    ("caching", &["cache", "caching", "lru", "redis", "memcache", "dogpile"]),
    ("email sending", &["email", "smtp", "mail", "yagmail", "messaging"]),
    ("validation", &["validate", "schema", "pydantic", "cerberus", "marshmallow", "jsonschema"]),
    ("authentication", &["auth", "jwt", "oauth", "token", "login", "bcrypt"]),
    ("error handling", &["error", "exception", "assert", "raise", "try", "catch"]),
];

/// The default intent catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinIntents;

impl IntentSource for BuiltinIntents {
    fn name(&self) -> &str {
        "builtin"
    }

    fn register(&self, builder: &mut RegistryBuilder) -> Result<()> {
        for (intent, signatures) in INTENT_SIGNATURES {
            builder.intent(intent, signatures.iter())?;
        }
        for (intent, aliases) in INTENT_ALIASES {
            builder.alias(intent, aliases.iter());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::{IntentRegistry, Signature};

    #[test]
    fn test_builtin_registry_builds() {
        let registry = IntentRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 23);
    }

    #[test]
    fn test_every_intent_has_well_formed_signatures() {
        let registry = IntentRegistry::builtin().unwrap();
        for name in registry.all_intent_names() {
            let sigs = registry.signatures_for(name).unwrap();
            assert!(!sigs.is_empty(), "{name} has no signatures");
            for sig in sigs {
                assert!(Signature::parse(sig.as_str()).is_some(), "{sig}");
            }
        }
    }

    #[test]
    fn test_conflicting_aliases_resolved() {
        let registry = IntentRegistry::builtin().unwrap();
        assert_eq!(registry.resolve_alias("redis"), Some("caching"));
        assert_eq!(registry.resolve_alias("error"), Some("error handling"));
        assert_eq!(registry.resolve_alias("req"), Some("http request"));
        assert_eq!(registry.resolve_alias("kdf"), Some("file encryption"));
    }
}
