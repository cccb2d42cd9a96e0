extern crate argparse;
extern crate env_logger;
extern crate pollfetch;

use std::cell::Cell;
use std::process::exit;
use std::rc::Rc;
use std::time::Duration;

use argparse::{ArgumentParser, Store, StoreOption};
use pollfetch::{Config, HttpClient, HttpUrl, Loop, OutFileStream};


fn main() {
    env_logger::init();

    let mut url = String::new();
    let mut output = "result.txt".to_string();
    let mut poll_interval_ms: Option<u64> = None;
    let mut max_body_size: Option<u64> = None;
    let mut user_agent: Option<String> = None;
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Downloads a single http:// URL into a file");
        ap.refer(&mut url)
            .add_argument("url", Store, "URL to download")
            .required();
        ap.refer(&mut output)
            .add_option(&["-o", "--output"], Store,
                "File to save the response body to (default result.txt)");
        ap.refer(&mut poll_interval_ms)
            .add_option(&["--poll-interval-ms"], StoreOption,
                "Pause between loop passes in milliseconds");
        ap.refer(&mut max_body_size)
            .add_option(&["--max-body-size"], StoreOption,
                "Abort if the response body is larger (bytes)");
        ap.refer(&mut user_agent)
            .add_option(&["--user-agent"], StoreOption,
                "User-Agent header to send");
        ap.parse_args_or_exit();
    }

    let url = match HttpUrl::parse(&url) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Bad url: {}", e);
            exit(1);
        }
    };
    if !url.is_http() {
        eprintln!("Bad url: use http protocol only");
        exit(1);
    }

    let mut config = Config::new();
    if let Some(ms) = poll_interval_ms {
        config = config.poll_interval(Duration::from_millis(ms));
    }
    if let Some(size) = max_body_size {
        config = config.max_body_size(size);
    }
    if let Some(agent) = user_agent {
        config = config.user_agent(agent);
    }

    let lp = Loop::new(&config);
    let out = match OutFileStream::create(&lp.handle(), &output) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Can't create {}: {}", output, e);
            exit(1);
        }
    };
    let client = match HttpClient::new(&lp.handle(), url, &config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Can't create client: {}", e);
            exit(1);
        }
    };

    let failed = Rc::new(Cell::new(false));
    let load_failed = failed.clone();
    client.load_stream(move |res| match res {
        Ok(part) if part.is_empty() => {}
        Ok(part) => {
            let write_failed = load_failed.clone();
            out.write(part.to_vec(), move |res| {
                if let Err(e) = res {
                    eprintln!("Error write data: {}", e);
                    write_failed.set(true);
                }
            });
        }
        Err(e) => {
            eprintln!("Error load data: {}", e);
            load_failed.set(true);
        }
    });

    lp.run();
    // Releases the output file, waiting for any write still in flight
    drop(client);

    if failed.get() {
        exit(1);
    }
    println!("Saved: {}", output);
}
